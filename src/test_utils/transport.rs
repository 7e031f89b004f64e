//! In-memory [`Transport`].

use crate::constants::{GITHUB_API_BASE, RELEASES_PER_PAGE};
use crate::core::ApmError;
use crate::release::{Asset, Release, Transport};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Side effect run when an asset is downloaded.
#[derive(Clone)]
struct DownloadHook(Arc<dyn Fn() + Send + Sync>);

impl fmt::Debug for DownloadHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DownloadHook")
    }
}

/// Serves release listings, single releases and asset bytes from maps.
///
/// URLs match what [`crate::release::ReleaseClient::new`] requests. Unknown
/// JSON URLs answer like a 404; unknown assets fail the download. Clones
/// share the request log.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    releases: HashMap<String, Vec<Release>>,
    assets: HashMap<String, Vec<u8>>,
    hooks: HashMap<String, DownloadHook>,
    authenticated: bool,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authenticated(mut self) -> Self {
        self.authenticated = true;
        self
    }

    /// Standalone asset reachable through [`Self::asset`].
    pub fn with_asset(mut self, name: &str, bytes: Vec<u8>) -> Self {
        self.assets.insert(standalone_url(name), bytes);
        self
    }

    /// Serve bytes for `asset.download_url`.
    pub fn with_asset_bytes(mut self, asset: &Asset, bytes: Vec<u8>) -> Self {
        self.assets.insert(asset.download_url.clone(), bytes);
        self
    }

    /// Add `release` to `repo`'s listing (newest first: add newest last) and
    /// make it fetchable by tag.
    pub fn with_release(mut self, repo: &str, release: Release) -> Self {
        self.releases.entry(repo.to_string()).or_default().insert(0, release);
        self
    }

    /// Run `hook` whenever an asset named `name` is downloaded, before its
    /// bytes are returned. Lets a test change the project mid-install.
    pub fn on_download(mut self, name: &str, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.hooks.insert(name.to_string(), DownloadHook(Arc::new(hook)));
        self
    }

    /// Descriptor of an asset added with [`Self::with_asset`].
    pub fn asset(&self, name: &str) -> Asset {
        let url = standalone_url(name);
        let size = self.assets.get(&url).map_or(0, |b| b.len() as u64);
        Asset::new(name, url, size)
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn record(&self, url: &str) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
    }

    fn release_json(&self, url: &str) -> Option<Value> {
        for (repo, releases) in &self.releases {
            let base = format!("{GITHUB_API_BASE}/repos/{repo}/releases");
            if url == format!("{base}?per_page={RELEASES_PER_PAGE}") {
                return serde_json::to_value(releases).ok();
            }
            if let Some(tag) = url.strip_prefix(&format!("{base}/tags/")) {
                return releases
                    .iter()
                    .find(|r| r.tag_name == tag)
                    .and_then(|r| serde_json::to_value(r).ok());
            }
        }
        None
    }
}

fn standalone_url(name: &str) -> String {
    format!("https://assets.example.test/{name}")
}

impl Transport for FakeTransport {
    async fn get_json(&self, url: &str) -> Result<Option<Value>, ApmError> {
        self.record(url);
        Ok(self.release_json(url))
    }

    async fn get_asset(&self, asset: &Asset) -> Result<Vec<u8>, ApmError> {
        self.record(&asset.download_url);
        if let Some(DownloadHook(hook)) = self.hooks.get(&asset.name) {
            hook();
        }
        self.assets.get(&asset.download_url).cloned().ok_or_else(|| ApmError::DownloadFailed {
            url: asset.download_url.clone(),
            reason: "HTTP 404 Not Found".to_string(),
        })
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}
