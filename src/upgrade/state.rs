//! Phases of one update attempt.
//!
//! ```text
//! Idle -> Resolving -> BackedUp -> Installing -> MetadataWritten -> Done
//!                                      |               |
//!                                      +---> Failed <--+
//!                                              |
//!                                         RollingBack -> RolledBack
//!                                              |
//!                                              +-------> RollbackFailed
//! ```
//!
//! [`UpdateTracker`] rejects any other transition, and refuses to leave
//! `Resolving` without an open backup snapshot.

use crate::core::ApmError;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Idle,
    Resolving,
    BackedUp,
    Installing,
    MetadataWritten,
    Done,
    Failed,
    RollingBack,
    RolledBack,
    /// Terminal; the user has to recover from the backup by hand
    RollbackFailed,
}

impl UpdatePhase {
    /// Whether `next` may follow `self`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        use UpdatePhase::{
            BackedUp, Done, Failed, Idle, Installing, MetadataWritten, Resolving, RolledBack,
            RollbackFailed, RollingBack,
        };
        matches!(
            (self, next),
            (Idle, Resolving)
                | (Resolving, BackedUp)
                | (BackedUp, Installing)
                | (Installing, MetadataWritten)
                | (MetadataWritten, Done)
                | (Installing | MetadataWritten, Failed)
                | (Failed, RollingBack)
                | (RollingBack, RolledBack | RollbackFailed)
        )
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::RolledBack | Self::RollbackFailed)
    }
}

impl fmt::Display for UpdatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::BackedUp => "backed-up",
            Self::Installing => "installing",
            Self::MetadataWritten => "metadata-written",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::RollingBack => "rolling-back",
            Self::RolledBack => "rolled-back",
            Self::RollbackFailed => "rollback-failed",
        };
        f.write_str(name)
    }
}

/// Current phase plus whether a snapshot is open.
#[derive(Debug)]
pub struct UpdateTracker {
    phase: UpdatePhase,
    snapshot_open: bool,
}

impl Default for UpdateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateTracker {
    pub const fn new() -> Self {
        Self {
            phase: UpdatePhase::Idle,
            snapshot_open: false,
        }
    }

    pub const fn phase(&self) -> UpdatePhase {
        self.phase
    }

    /// Record that the backup snapshot now exists.
    pub fn snapshot_taken(&mut self) {
        self.snapshot_open = true;
    }

    /// Move to `next`.
    ///
    /// # Errors
    ///
    /// [`ApmError::Other`] for a transition the diagram does not allow, or for
    /// entering `BackedUp` before [`Self::snapshot_taken`].
    pub fn advance(&mut self, next: UpdatePhase) -> Result<(), ApmError> {
        if !self.phase.can_advance_to(next) {
            return Err(ApmError::Other {
                message: format!("invalid update transition {} -> {next}", self.phase),
            });
        }
        if next == UpdatePhase::BackedUp && !self.snapshot_open {
            return Err(ApmError::Other {
                message: "cannot enter backed-up without a snapshot".to_string(),
            });
        }
        debug!("Update phase: {} -> {next}", self.phase);
        self.phase = next;
        Ok(())
    }
}
