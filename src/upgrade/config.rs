use serde::{Deserialize, Serialize};

/// How backups taken before an update are packaged and retained.
///
/// Stored in the `[backup]` table of the global config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupPolicy {
    /// Compress the holding directory into a zip next to it.
    #[serde(default = "default_create_archive")]
    pub create_archive: bool,

    /// Keep the zip after a successful update as a recovery artifact.
    #[serde(default = "default_keep_archive")]
    pub keep_archive: bool,
}

impl Default for BackupPolicy {
    fn default() -> Self {
        Self {
            create_archive: default_create_archive(),
            keep_archive: default_keep_archive(),
        }
    }
}

const fn default_create_archive() -> bool {
    true
}

const fn default_keep_archive() -> bool {
    true
}
