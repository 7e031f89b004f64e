//! Structural validation of release manifests.
//!
//! Validation runs on the raw JSON document so that it can report every
//! problem at once: a missing field, a wrong type, an unsupported format
//! version and a duplicate id all end up in the same [`ValidationReport`].
//! Any error invalidates the whole manifest.

use crate::constants::{APM_DIR, SUPPORTED_MANIFEST_FORMAT};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Every problem found, in document order
    pub errors: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }
}

/// First present key among `names`, so older manifests with their original
/// field names validate the same way as current ones.
fn field<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| object.get(*name))
}

fn check_required_string(
    report: &mut ValidationReport,
    object: &Map<String, Value>,
    path: &str,
    names: &[&str],
) {
    let label = names[0];
    match field(object, names) {
        None | Some(Value::Null) => report.push(format!("{path}{label} missing")),
        Some(Value::String(s)) if s.trim().is_empty() => {
            report.push(format!("{path}{label} must not be empty"));
        }
        Some(Value::String(_)) => {}
        Some(_) => report.push(format!("{path}{label} must be a string")),
    }
}

fn check_optional_string(
    report: &mut ValidationReport,
    object: &Map<String, Value>,
    path: &str,
    name: &str,
) {
    match object.get(name) {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => report.push(format!("{path}{name} must be a string")),
    }
}

/// Why `dir` cannot be used as an assistant directory, if it cannot.
///
/// Backups move whole assistant directories, so each one must be a plain
/// relative path inside the project and outside the tool's own directory.
#[must_use]
pub fn config_dir_problem(dir: &str) -> Option<&'static str> {
    let trimmed = dir.trim();
    if trimmed.is_empty() {
        return Some("must not be empty");
    }
    if trimmed.starts_with(['/', '\\']) || trimmed.contains(':') || Path::new(trimmed).is_absolute() {
        return Some("must be a relative path");
    }

    let segments: Vec<&str> =
        trimmed.trim_end_matches(['/', '\\']).split(['/', '\\']).collect();
    if segments.iter().any(|s| s.is_empty() || *s == "." || *s == "..") {
        return Some("must not contain empty, '.' or '..' segments");
    }
    if segments[0] == APM_DIR {
        return Some("must not be inside .apm");
    }
    None
}

/// Validate a decoded manifest document.
///
/// Required: `formatVersion` equal to the supported version, and a non-empty
/// `assistants` array whose entries each carry non-empty `id`, `displayName`
/// and `bundleAssetName` strings. `configDir` and `description` are optional
/// strings; a `configDir` must pass [`config_dir_problem`]. Assistant ids must
/// be unique.
#[must_use]
pub fn validate(manifest: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    let Some(root) = manifest.as_object() else {
        report.push("manifest must be a JSON object");
        return report;
    };

    match field(root, &["formatVersion", "manifestVersion"]) {
        None | Some(Value::Null) => report.push("formatVersion missing"),
        Some(Value::String(v)) if v == SUPPORTED_MANIFEST_FORMAT => {}
        Some(Value::String(v)) => report.push(format!(
            "formatVersion '{v}' is not supported (expected '{SUPPORTED_MANIFEST_FORMAT}')"
        )),
        Some(_) => report.push("formatVersion must be a string"),
    }

    check_optional_string(&mut report, root, "", "templateVersion");

    let assistants = match root.get("assistants") {
        None | Some(Value::Null) => {
            report.push("assistants missing");
            return report;
        }
        Some(Value::Array(items)) => items,
        Some(_) => {
            report.push("assistants must be an array");
            return report;
        }
    };

    if assistants.is_empty() {
        report.push("assistants must not be empty");
        return report;
    }

    let mut seen_ids: HashMap<&str, usize> = HashMap::new();
    for (index, entry) in assistants.iter().enumerate() {
        let path = format!("assistants[{index}].");
        let Some(object) = entry.as_object() else {
            report.push(format!("assistants[{index}] must be an object"));
            continue;
        };

        check_required_string(&mut report, object, &path, &["id"]);
        check_required_string(&mut report, object, &path, &["displayName", "name"]);
        check_required_string(&mut report, object, &path, &["bundleAssetName", "bundle"]);
        check_optional_string(&mut report, object, &path, "configDir");
        if let Some(dir) = object.get("configDir").and_then(Value::as_str)
            && let Some(problem) = config_dir_problem(dir)
        {
            report.push(format!("{path}configDir '{dir}' {problem}"));
        }
        check_optional_string(&mut report, object, &path, "description");

        if let Some(id) = object.get("id").and_then(Value::as_str).filter(|id| !id.is_empty()) {
            if let Some(first) = seen_ids.get(id) {
                report.push(format!("assistants[{index}].id '{id}' duplicates assistants[{first}].id"));
            } else {
                seen_ids.insert(id, index);
            }
        }
    }

    report
}
