//! Queue-driven [`Prompter`].

use crate::core::ApmError;
use crate::core::prompt::{Choice, Prompter, TextValidator};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Confirm(bool),
    /// Value of the choice to pick
    Select(String),
    Text(String),
}

impl Answer {
    pub fn select(value: impl Into<String>) -> Self {
        Self::Select(value.into())
    }
}

/// Answers prompts in order and records every question asked.
///
/// A prompt whose next scripted answer is missing or of the wrong kind fails
/// with [`ApmError::PromptFailed`], which makes unexpected questions visible
/// in test failures.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Answer>>,
    asked: Mutex<Vec<String>>,
    unattended: bool,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
            unattended: false,
        }
    }

    /// Report the answers as automatic, the way `--yes` does.
    #[must_use]
    pub fn unattended(mut self) -> Self {
        self.unattended = true;
        self
    }

    /// Prompter that fails on any question.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Questions asked so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Scripted answers not consumed yet.
    pub fn remaining(&self) -> usize {
        self.answers.lock().map(|a| a.len()).unwrap_or_default()
    }

    fn next(&self, message: &str) -> Result<Answer, ApmError> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(message.to_string());
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut a| a.pop_front())
            .ok_or_else(|| ApmError::PromptFailed {
                reason: format!("no scripted answer for: {message}"),
            })
    }
}

fn unexpected(message: &str, answer: &Answer) -> ApmError {
    ApmError::PromptFailed {
        reason: format!("scripted answer {answer:?} does not fit prompt: {message}"),
    }
}

impl Prompter for ScriptedPrompter {
    fn is_interactive(&self) -> bool {
        !self.unattended
    }

    async fn confirm(&self, message: &str, _default: bool) -> Result<bool, ApmError> {
        match self.next(message)? {
            Answer::Confirm(value) => Ok(value),
            other => Err(unexpected(message, &other)),
        }
    }

    async fn select_one(&self, message: &str, choices: &[Choice]) -> Result<String, ApmError> {
        match self.next(message)? {
            Answer::Select(value) if choices.iter().any(|c| c.value == value) => Ok(value),
            other => Err(unexpected(message, &other)),
        }
    }

    async fn text_input(
        &self,
        message: &str,
        validator: TextValidator,
    ) -> Result<String, ApmError> {
        match self.next(message)? {
            Answer::Text(value) => {
                validator(&value).map_err(|reason| ApmError::PromptFailed {
                    reason,
                })?;
                Ok(value)
            }
            other => Err(unexpected(message, &other)),
        }
    }
}
