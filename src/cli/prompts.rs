//! Terminal implementation of [`Prompter`].

use crate::core::ApmError;
use crate::core::prompt::{Choice, Prompter, TextValidator};
use colored::Colorize;
use std::io::{IsTerminal, Write};
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

/// Prompts on stdin/stdout.
///
/// With `assume_yes`, confirmations answer yes and selections take the first
/// choice without reading input. Without it, prompting in a non-interactive
/// session fails instead of blocking.
pub struct TerminalPrompter {
    assume_yes: bool,
    input: Mutex<BufReader<Stdin>>,
}

impl TerminalPrompter {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            input: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }

    fn ensure_interactive(message: &str) -> Result<(), ApmError> {
        if std::io::stdin().is_terminal() {
            Ok(())
        } else {
            Err(ApmError::PromptFailed {
                reason: format!(
                    "cannot ask \"{}\" in a non-interactive session; pass --yes to accept",
                    message.lines().last().unwrap_or(message)
                ),
            })
        }
    }

    async fn ask(&self, prompt: &str) -> Result<String, ApmError> {
        print!("{prompt}");
        std::io::stdout().flush().map_err(|e| ApmError::PromptFailed {
            reason: e.to_string(),
        })?;

        let mut line = String::new();
        let read = self.input.lock().await.read_line(&mut line).await.map_err(|e| {
            ApmError::PromptFailed {
                reason: e.to_string(),
            }
        })?;
        if read == 0 {
            return Err(ApmError::PromptFailed {
                reason: "input closed".to_string(),
            });
        }
        Ok(line.trim().to_string())
    }
}

impl Prompter for TerminalPrompter {
    fn is_interactive(&self) -> bool {
        !self.assume_yes
    }

    async fn confirm(&self, message: &str, default: bool) -> Result<bool, ApmError> {
        if self.assume_yes {
            println!("{message} {}", "yes (--yes)".dimmed());
            return Ok(true);
        }
        Self::ensure_interactive(message)?;

        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = self.ask(&format!("{} {} ", message.bold(), hint.dimmed())).await?;
            match answer.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => println!("{}", "Please answer y or n.".yellow()),
            }
        }
    }

    async fn select_one(&self, message: &str, choices: &[Choice]) -> Result<String, ApmError> {
        let Some(first) = choices.first() else {
            return Err(ApmError::PromptFailed {
                reason: format!("nothing to choose for: {message}"),
            });
        };
        if self.assume_yes {
            println!("{message}: {} {}", first.label, "(--yes)".dimmed());
            return Ok(first.value.clone());
        }
        Self::ensure_interactive(message)?;

        println!("{}", message.bold());
        for (index, choice) in choices.iter().enumerate() {
            println!("  {} {}", format!("{})", index + 1).cyan(), choice.label);
        }
        loop {
            let answer = self.ask(&format!("Choice [1-{}]: ", choices.len())).await?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=choices.len()).contains(&n) => return Ok(choices[n - 1].value.clone()),
                _ => println!("{}", "Enter one of the listed numbers.".yellow()),
            }
        }
    }

    async fn text_input(
        &self,
        message: &str,
        validator: TextValidator,
    ) -> Result<String, ApmError> {
        Self::ensure_interactive(message)?;
        loop {
            let answer = self.ask(&format!("{}: ", message.bold())).await?;
            match validator(&answer) {
                Ok(()) => return Ok(answer),
                Err(reason) => println!("{}", reason.red()),
            }
        }
    }
}
