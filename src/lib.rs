//! APM - Agentic Project Management template installer
//!
//! APM installs assistant-specific template bundles (prompts, commands and
//! shared guides) published as GitHub release assets, and keeps them up to
//! date. Every install and update runs as a transaction: the managed
//! directories are moved into a backup first, and any failure restores them.
//!
//! # Architecture Overview
//!
//! - [`release`] - GitHub release discovery and asset downloads
//! - [`manifest`] - The `apm-release.json` manifest describing a release's bundles
//! - [`version`] - Template tag parsing (`v<base>+templates.<n>`) and ordering
//! - [`installer`] - Bundle extraction with the shared scaffold written once
//! - [`metadata`] - The per-project `.apm/metadata.json` installation record
//! - [`upgrade`] - Backup, rollback and the install/update orchestration
//! - [`config`] - Assistant directory table and the global user config
//! - [`cli`] - Command-line interface
//!
//! # Project Layout
//!
//! ```text
//! project/
//! ├── .apm/
//! │   ├── metadata.json        # installation record
//! │   ├── guides/              # managed shared scaffold
//! │   └── Memory/              # created once, never overwritten
//! ├── .claude/commands/        # one directory per installed assistant
//! └── .cursor/commands/
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod installer;
pub mod manifest;
pub mod metadata;
pub mod release;
pub mod upgrade;
pub mod utils;
pub mod version;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
