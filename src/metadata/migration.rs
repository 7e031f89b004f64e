//! Migration of single-assistant installation records.
//!
//! Early installs stored `{"version": <tag>, "assistant": <name>, "installedAt": ...}`
//! where `assistant` was either an id or a display name such as
//! `"Claude Code"`. Migration wraps that value into a list, unions it with
//! the assistant directories found on disk, and produces a current record.
//! A migrated record is no longer legacy, so migrating again is a no-op.

use super::{InstallationMetadata, Source};
use crate::config::AssistantDirectories;
use crate::constants::OFFICIAL_REPOSITORY;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::warn;

/// The single-assistant record shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyMetadata {
    pub version: String,
    #[serde(default)]
    pub assistant: Option<String>,
    #[serde(default)]
    pub installed_at: Option<String>,
}

impl LegacyMetadata {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// A record is legacy when it has a singular `assistant` and no `assistants`.
#[must_use]
pub fn is_legacy(value: &Value) -> bool {
    value.as_object().is_some_and(|o| o.contains_key("assistant") && !o.contains_key("assistants"))
}

/// Convert a legacy record into the current schema.
///
/// The stored assistant name is mapped to its id through `directories`;
/// names the table does not know are kept verbatim. Assistants whose
/// directory exists under `project_dir` are appended in table order.
#[must_use]
pub fn migrate(
    legacy: LegacyMetadata,
    directories: &AssistantDirectories,
    project_dir: &Path,
    cli_version: &str,
) -> InstallationMetadata {
    let mut assistants: Vec<String> = Vec::new();
    if let Some(name) = legacy.assistant.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        let id = directories.resolve_id(name).unwrap_or(name).to_string();
        assistants.push(id);
    }
    for detected in directories.detect_installed(project_dir) {
        if !assistants.contains(&detected) {
            assistants.push(detected);
        }
    }

    let installed_at = legacy
        .installed_at
        .as_deref()
        .and_then(|s| match DateTime::parse_from_rfc3339(s) {
            Ok(t) => Some(t.with_timezone(&Utc)),
            Err(e) => {
                warn!("Ignoring unparseable installedAt '{s}': {e}");
                None
            }
        })
        .unwrap_or_else(Utc::now);

    InstallationMetadata {
        cli_version: cli_version.to_string(),
        template_version: legacy.version,
        assistants,
        installed_at,
        last_updated_at: installed_at,
        source: Source::Official,
        repository: OFFICIAL_REPOSITORY.to_string(),
    }
}
