//! Release manifest (`apm-release.json`).
//!
//! Every release publishes one manifest asset listing the assistants it
//! supports and the bundle asset for each. The manifest is versioned by
//! `formatVersion`; a manifest declaring any version other than
//! [`SUPPORTED_MANIFEST_FORMAT`] is rejected, never parsed best-effort.
//!
//! ```json
//! {
//!   "formatVersion": "1.0",
//!   "templateVersion": "v0.5.0+templates.2",
//!   "assistants": [
//!     {
//!       "id": "claude",
//!       "displayName": "Claude Code",
//!       "bundleAssetName": "apm-claude.zip",
//!       "configDir": ".claude/commands"
//!     }
//!   ]
//! }
//! ```
//!
//! Decoding is two-step: the raw JSON is first checked by
//! [`validate`](manifest_validation::validate), which collects every problem,
//! and only a clean document is deserialized into [`ReleaseManifest`].

pub mod manifest_validation;

pub use manifest_validation::{ValidationReport, validate};

use crate::constants::SUPPORTED_MANIFEST_FORMAT;
use crate::core::ApmError;
use serde::{Deserialize, Serialize};

/// Typed release manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseManifest {
    /// Schema version of this document
    #[serde(alias = "manifestVersion")]
    pub format_version: String,

    /// Release tag the manifest was generated for, when recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_version: Option<String>,

    /// Installable targets, in publisher order
    pub assistants: Vec<AssistantDescriptor>,
}

/// One installable assistant target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantDescriptor {
    pub id: String,

    #[serde(alias = "name")]
    pub display_name: String,

    /// File name of the zip asset in the same release
    #[serde(alias = "bundle")]
    pub bundle_asset_name: String,

    /// Directory the bundle installs commands into, relative to the project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ReleaseManifest {
    /// Decode and validate manifest bytes downloaded for release `tag`.
    ///
    /// # Errors
    ///
    /// [`ApmError::ManifestInvalid`] with `"bad encoding"` when the bytes are not
    /// JSON, or with the complete field-error list when validation fails.
    pub fn from_slice(bytes: &[u8], tag: &str) -> Result<Self, ApmError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| ApmError::ManifestInvalid {
                tag: tag.to_string(),
                errors: vec![format!("bad encoding: {e}")],
            })?;
        Self::from_value(value, tag)
    }

    /// Validate an already-decoded JSON document and convert it.
    pub fn from_value(value: serde_json::Value, tag: &str) -> Result<Self, ApmError> {
        let report = validate(&value);
        if !report.is_valid() {
            return Err(ApmError::ManifestInvalid {
                tag: tag.to_string(),
                errors: report.errors,
            });
        }

        serde_json::from_value(value).map_err(|e| ApmError::ManifestInvalid {
            tag: tag.to_string(),
            errors: vec![e.to_string()],
        })
    }

    /// Look up an assistant by id.
    #[must_use]
    pub fn find_assistant(&self, id: &str) -> Option<&AssistantDescriptor> {
        self.assistants.iter().find(|a| a.id == id)
    }

    /// Assistant ids in publisher order.
    #[must_use]
    pub fn assistant_ids(&self) -> Vec<String> {
        self.assistants.iter().map(|a| a.id.clone()).collect()
    }

    /// Whether this document uses the format version this engine understands.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.format_version == SUPPORTED_MANIFEST_FORMAT
    }
}
