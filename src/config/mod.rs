//! Configuration for APM.
//!
//! - [`global`]: user-wide settings (`~/.apm/config.toml`) holding trusted
//!   custom repositories and the backup policy.
//! - [`assistants`]: the assistant-to-directory table injected into the
//!   metadata store and the update engine.
//!
//! Project state (which release is installed) is not configuration; it lives
//! in the installation record managed by [`crate::metadata`].

pub mod assistants;
pub mod global;

pub use assistants::{AssistantDirectories, AssistantEntry};
pub use global::{GlobalConfig, RepoTrustSetting};
