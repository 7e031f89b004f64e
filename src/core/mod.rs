//! Core types shared by every layer of APM.
//!
//! - [`error`] holds the [`ApmError`] taxonomy and CLI error presentation.
//! - [`prompt`] defines the [`Prompter`] seam through which the engine asks
//!   the user for confirmations and choices.

pub mod error;
pub mod prompt;

pub use error::{ApmError, ErrorContext, user_friendly_error};
pub use prompt::Prompter;
