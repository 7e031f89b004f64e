//! Test utilities for APM
//!
//! Everything here runs without network access or a terminal:
//! - [`FakeTransport`] serves releases and assets from memory
//! - [`ScriptedPrompter`] answers prompts from a queue and records the questions
//! - [`TemplateRelease`] builds a release with its manifest and zip bundles
//!
//! # Example
//!
//! ```rust,no_run
//! use apm_cli::test_utils::{FakeTransport, TemplateRelease};
//!
//! let transport = TemplateRelease::new("v1.0.0+templates.1")
//!     .assistant("claude", "Claude Code", ".claude/commands")
//!     .publish(FakeTransport::new(), "sdi2200262/agentic-project-management");
//! ```

pub mod fixtures;
pub mod prompter;
pub mod transport;

pub use fixtures::{TemplateRelease, build_zip, snapshot_tree};
pub use prompter::{Answer, ScriptedPrompter};
pub use transport::FakeTransport;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; does nothing when neither
/// is set.
///
/// ```bash
/// RUST_LOG=apm_cli=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_ansi(true)
            .try_init();
    });
}
