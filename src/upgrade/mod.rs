//! Safe install and update of template releases.
//!
//! # Architecture Overview
//!
//! - **[`UpdateOrchestrator`]**: resolves the target release, asks for the
//!   confirmations the version policy requires, and runs the transaction
//! - **[`backup::BackupManager`]**: moves managed directories aside before
//!   anything is written and puts them back on failure
//! - **[`state::UpdateTracker`]**: checked phase transitions of one attempt
//! - **[`config::BackupPolicy`]**: archive creation and retention
//!
//! ## Update Flow
//!
//! ```text
//! 1. Resolve (no side effects)
//!    ├── Read the installation record (migrating a legacy one)
//!    ├── Pick the release: same base version, newest build
//!    └── Fetch and validate the manifest; check every bundle exists
//!
//! 2. Back up
//!    ├── Move assistant directories and .apm/guides into .apm/backup-<tag>
//!    └── Zip the holding directory (best effort)
//!
//! 3. Install
//!    ├── Extract each assistant bundle in order
//!    └── Write the shared scaffold only with the first bundle
//!
//! 4. Record
//!    ├── Write .apm/metadata.json
//!    └── Drop the holding directory, keep the zip
//!
//! On failure in 3 or 4: undo written files, move the backup back.
//! ```

pub mod backup;
pub mod config;
pub mod orchestrator;
pub mod state;

pub use backup::{BackupManager, BackupSnapshot};
pub use config::BackupPolicy;
pub use orchestrator::{
    InstallOptions, InstallSource, OperationReport, Outcome, UpdateOptions, UpdateOrchestrator,
};
pub use state::{UpdatePhase, UpdateTracker};
