//! Integration test suite for APM
//!
//! End-to-end tests driving installs and updates against an in-memory GitHub
//! transport and scripted prompts, plus a few tests of the `apm` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **install**: `init` flows, assistant selection and preflight failures
//! - **update**: update selection, up-to-date detection and legacy records
//! - **rollback**: failed installs leave the project byte-identical
//! - **custom_repo**: disclaimer, release selection and trust settings
//! - **cli**: argument handling of the binary

mod cli;
mod common;
mod custom_repo;
mod install;
mod rollback;
mod update;
