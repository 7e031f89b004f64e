//! User interaction seam.
//!
//! The update engine never talks to a terminal directly. Every confirmation,
//! choice and free-text answer goes through a [`Prompter`] supplied by the
//! caller; the CLI passes a terminal implementation and tests pass a scripted
//! one.

use crate::core::ApmError;
use std::future::Future;

/// A selectable option shown by [`Prompter::select_one`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Text shown to the user
    pub label: String,
    /// Value returned when chosen
    pub value: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Validator applied to free-text answers; returns an error message on rejection.
pub type TextValidator = fn(&str) -> Result<(), String>;

/// Interactive prompt collaborator.
///
/// The engine only proceeds past a confirmation point on an explicit `true`.
pub trait Prompter: Sync {
    /// Ask a yes/no question.
    fn confirm(
        &self,
        message: &str,
        default: bool,
    ) -> impl Future<Output = Result<bool, ApmError>> + Send;

    /// Ask the user to pick one of `choices`, returning the chosen value.
    fn select_one(
        &self,
        message: &str,
        choices: &[Choice],
    ) -> impl Future<Output = Result<String, ApmError>> + Send;

    /// Ask for a line of text that must pass `validator`.
    fn text_input(
        &self,
        message: &str,
        validator: TextValidator,
    ) -> impl Future<Output = Result<String, ApmError>> + Send;

    /// Whether a person answers the questions.
    ///
    /// `false` when answers are automatic (for example `--yes`); choices that
    /// outlive the current run are then not offered.
    fn is_interactive(&self) -> bool {
        true
    }
}
