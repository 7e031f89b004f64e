//! Assistant-to-directory table.
//!
//! Each supported assistant installs its commands into one directory of the
//! project (for example `.claude/commands`). The table is passed explicitly to
//! the metadata store and the update orchestrator rather than read from a
//! global, so tests can run against synthetic assistant sets. A release
//! manifest may override or extend it through its `configDir` fields.

use crate::manifest::ReleaseManifest;
use std::path::Path;

/// One row of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantEntry {
    pub id: String,
    pub display_name: String,
    /// Directory relative to the project root, with `/` separators
    pub config_dir: String,
}

impl AssistantEntry {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        config_dir: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            config_dir: config_dir.into(),
        }
    }
}

const BUILTIN: &[(&str, &str, &str)] = &[
    ("cursor", "Cursor", ".cursor/commands"),
    ("copilot", "GitHub Copilot", ".github/prompts"),
    ("claude", "Claude Code", ".claude/commands"),
    ("gemini", "Gemini CLI", ".gemini/commands"),
    ("qwen", "Qwen Code", ".qwen/commands"),
    ("opencode", "opencode", ".opencode/command"),
    ("windsurf", "Windsurf", ".windsurf/workflows"),
    ("kilocode", "Kilo Code", ".kilocode/workflows"),
    ("auggie", "Auggie CLI", ".augment/commands"),
    ("roo", "Roo Code", ".roo/commands"),
];

/// Ordered assistant table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantDirectories {
    entries: Vec<AssistantEntry>,
}

impl Default for AssistantDirectories {
    fn default() -> Self {
        Self::new(BUILTIN.iter().map(|(id, name, dir)| AssistantEntry::new(*id, *name, *dir)))
    }
}

impl AssistantDirectories {
    pub fn new(entries: impl IntoIterator<Item = AssistantEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn entries(&self) -> &[AssistantEntry] {
        &self.entries
    }

    /// Copy of this table with the manifest's `configDir` values applied.
    ///
    /// Manifest assistants unknown to the table are appended; entries without
    /// a `configDir` keep the table's directory.
    #[must_use]
    pub fn with_manifest(&self, manifest: &ReleaseManifest) -> Self {
        let mut merged = self.clone();
        for descriptor in &manifest.assistants {
            let existing = merged.entries.iter_mut().find(|e| e.id == descriptor.id);
            match (existing, &descriptor.config_dir) {
                (Some(entry), Some(dir)) => entry.config_dir.clone_from(dir),
                (Some(_), None) => {}
                (None, Some(dir)) => merged.entries.push(AssistantEntry::new(
                    &descriptor.id,
                    &descriptor.display_name,
                    dir,
                )),
                (None, None) => {}
            }
        }
        merged
    }

    #[must_use]
    pub fn dir_for(&self, id: &str) -> Option<&str> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.config_dir.as_str())
    }

    /// Resolve an id or a display name (as stored by older installs) to an id.
    #[must_use]
    pub fn resolve_id(&self, name_or_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.id == name_or_id)
            .or_else(|| {
                self.entries.iter().find(|e| e.display_name.eq_ignore_ascii_case(name_or_id))
            })
            .map(|e| e.id.as_str())
    }

    /// Ids whose directory exists under `project_dir`, in table order.
    #[must_use]
    pub fn detect_installed(&self, project_dir: &Path) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| project_dir.join(&e.config_dir).is_dir())
            .map(|e| e.id.clone())
            .collect()
    }
}
