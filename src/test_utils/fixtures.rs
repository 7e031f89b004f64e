//! Test fixtures for releases, bundles and project trees

use crate::constants::MANIFEST_ASSET_NAME;
use crate::release::{Asset, Release};
use crate::test_utils::FakeTransport;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{Cursor, Write};
use std::path::Path;
use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Build an in-memory zip. `None` content adds a directory entry.
pub fn build_zip(entries: &[(&str, Option<&str>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        match content {
            Some(content) => {
                writer.start_file(*name, options).expect("start zip entry");
                writer.write_all(content.as_bytes()).expect("write zip entry");
            }
            None => writer.add_directory(*name, options).expect("add zip directory"),
        }
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Every file and directory under `root`, keyed by relative path.
///
/// Directories map to `None`. Two equal snapshots mean byte-identical trees.
pub fn snapshot_tree(root: &Path) -> BTreeMap<String, Option<Vec<u8>>> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(root)
                .expect("entry under root")
                .to_string_lossy()
                .replace('\\', "/");
            let content = entry
                .file_type()
                .is_file()
                .then(|| std::fs::read(entry.path()).expect("read file"));
            (relative, content)
        })
        .collect()
}

#[derive(Debug, Clone)]
struct BundleSpec {
    id: String,
    display_name: String,
    config_dir: String,
}

/// A template release: manifest plus one zip per assistant.
///
/// Each bundle contains `<config_dir>/apm-1-initiate-setup.md` (content
/// `"<id> <tag>"`) and every scaffold file, unless
/// [`Self::bundle_scaffold`] gave it its own.
#[derive(Debug, Clone)]
pub struct TemplateRelease {
    tag: String,
    prerelease: bool,
    bundles: Vec<BundleSpec>,
    scaffold: Vec<(String, String)>,
    bundle_scaffolds: HashMap<String, Vec<(String, String)>>,
    corrupt: HashSet<String>,
    missing: HashSet<String>,
    manifest: Option<Value>,
    omit_manifest: bool,
}

impl TemplateRelease {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            prerelease: false,
            bundles: Vec::new(),
            scaffold: vec![
                (
                    ".apm/guides/Implementation_Plan_Guide.md".to_string(),
                    format!("implementation plan guide {tag}"),
                ),
                (".apm/Memory/Memory_Root.md".to_string(), "memory root template".to_string()),
            ],
            bundle_scaffolds: HashMap::new(),
            corrupt: HashSet::new(),
            missing: HashSet::new(),
            manifest: None,
            omit_manifest: false,
        }
    }

    pub fn assistant(mut self, id: &str, display_name: &str, config_dir: &str) -> Self {
        self.bundles.push(BundleSpec {
            id: id.to_string(),
            display_name: display_name.to_string(),
            config_dir: config_dir.to_string(),
        });
        self
    }

    pub fn prerelease(mut self) -> Self {
        self.prerelease = true;
        self
    }

    /// Replace the scaffold with the given files.
    pub fn scaffold(mut self, files: &[(&str, &str)]) -> Self {
        self.scaffold = files.iter().map(|(p, c)| ((*p).to_string(), (*c).to_string())).collect();
        self
    }

    /// Pack a different scaffold into `id`'s bundle only.
    pub fn bundle_scaffold(mut self, id: &str, files: &[(&str, &str)]) -> Self {
        let files = files.iter().map(|(p, c)| ((*p).to_string(), (*c).to_string())).collect();
        self.bundle_scaffolds.insert(id.to_string(), files);
        self
    }

    /// Publish a non-zip payload as `id`'s bundle.
    pub fn corrupt_bundle(mut self, id: &str) -> Self {
        self.corrupt.insert(id.to_string());
        self
    }

    /// List `id` in the manifest without attaching its bundle.
    pub fn without_bundle(mut self, id: &str) -> Self {
        self.missing.insert(id.to_string());
        self
    }

    pub fn with_manifest(mut self, manifest: Value) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn without_manifest(mut self) -> Self {
        self.omit_manifest = true;
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn bundle_name(id: &str) -> String {
        format!("apm-{id}.zip")
    }

    pub fn manifest_json(&self) -> Value {
        self.manifest.clone().unwrap_or_else(|| {
            json!({
                "formatVersion": "1.0",
                "templateVersion": self.tag,
                "assistants": self.bundles.iter().map(|b| json!({
                    "id": b.id,
                    "displayName": b.display_name,
                    "bundleAssetName": Self::bundle_name(&b.id),
                    "configDir": b.config_dir,
                })).collect::<Vec<_>>(),
            })
        })
    }

    fn bundle_bytes(&self, spec: &BundleSpec) -> Vec<u8> {
        if self.corrupt.contains(&spec.id) {
            return b"this is not a zip archive".to_vec();
        }
        let command_path = format!("{}/apm-1-initiate-setup.md", spec.config_dir);
        let command = format!("{} {}", spec.id, self.tag);
        let mut entries: Vec<(&str, Option<&str>)> =
            vec![(command_path.as_str(), Some(command.as_str()))];
        let scaffold = self.bundle_scaffolds.get(&spec.id).unwrap_or(&self.scaffold);
        for (path, content) in scaffold {
            entries.push((path.as_str(), Some(content.as_str())));
        }
        build_zip(&entries)
    }

    /// Attach the release and its assets to `transport` under `repo`.
    pub fn publish(self, transport: FakeTransport, repo: &str) -> FakeTransport {
        let base = format!("https://github.com/{repo}/releases/download/{}", self.tag);
        let mut release = Release::new(&self.tag);
        release.prerelease = self.prerelease;
        let mut payloads = Vec::new();

        if !self.omit_manifest {
            let bytes = serde_json::to_vec(&self.manifest_json()).expect("manifest json");
            let url = format!("{base}/{MANIFEST_ASSET_NAME}");
            payloads.push((Asset::new(MANIFEST_ASSET_NAME, url, bytes.len() as u64), bytes));
        }
        for spec in &self.bundles {
            if self.missing.contains(&spec.id) {
                continue;
            }
            let name = Self::bundle_name(&spec.id);
            let bytes = self.bundle_bytes(spec);
            payloads.push((Asset::new(&name, format!("{base}/{name}"), bytes.len() as u64), bytes));
        }

        let mut transport = transport;
        for (asset, bytes) in payloads {
            transport = transport.with_asset_bytes(&asset, bytes);
            release = release.with_asset(asset);
        }
        transport.with_release(repo, release)
    }
}
