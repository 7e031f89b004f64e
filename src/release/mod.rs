//! GitHub release discovery.
//!
//! [`ReleaseClient`] lists releases for the official repository (pinned to
//! this tool's major version) or for a user-designated custom repository
//! (unfiltered), fetches single releases by tag, and downloads manifest and
//! bundle assets. All HTTP goes through a [`Transport`], so tests drive the
//! client with an in-memory fake.
//!
//! "Not found" conditions that callers may want to continue past are returned
//! as `Option`s ([`Release::find_asset`], [`Release::find_manifest_asset`]);
//! transport failures and corrupt content are errors.

pub mod transport;
pub mod verification;

pub use transport::{GitHubTransport, Transport, resolve_token};

use crate::constants::{
    GITHUB_API_BASE, MANIFEST_ASSET_NAME, OFFICIAL_REPOSITORY, RELEASES_PER_PAGE,
    TOOL_MAJOR_VERSION,
};
use crate::core::ApmError;
use crate::manifest::ReleaseManifest;
use crate::version::parse_tag;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// A published release, as returned by the GitHub releases API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,

    /// Release notes (GitHub `body`)
    #[serde(rename = "body", default, deserialize_with = "null_as_empty")]
    pub notes: String,

    #[serde(default)]
    pub prerelease: bool,

    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,

    /// Public download URL (`browser_download_url`)
    #[serde(rename = "browser_download_url")]
    pub download_url: String,

    /// API URL of the asset, used for authenticated downloads
    #[serde(rename = "url", default)]
    pub api_url: String,

    #[serde(rename = "size", default)]
    pub size_bytes: u64,

    /// Content digest published by GitHub, e.g. `sha256:ab12...`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Release {
    /// Release with no assets or notes.
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            notes: String::new(),
            prerelease: false,
            assets: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.assets.push(asset);
        self
    }

    /// Asset with exactly this file name.
    #[must_use]
    pub fn find_asset(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.name == name)
    }

    /// The manifest asset, if the release carries one.
    #[must_use]
    pub fn find_manifest_asset(&self) -> Option<&Asset> {
        self.find_asset(MANIFEST_ASSET_NAME)
    }
}

impl Asset {
    pub fn new(name: impl Into<String>, download_url: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            download_url: download_url.into(),
            api_url: String::new(),
            size_bytes,
            digest: None,
        }
    }
}

/// `owner/repo` coordinates of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

fn is_valid_repo_part(part: &str) -> bool {
    !part.is_empty()
        && part != "."
        && part != ".."
        && part.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

impl Repository {
    /// The repository publishing official releases.
    #[must_use]
    pub fn official() -> Self {
        // OFFICIAL_REPOSITORY is a valid owner/repo literal
        let (owner, name) = OFFICIAL_REPOSITORY.split_once('/').unwrap_or((OFFICIAL_REPOSITORY, ""));
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }

    #[must_use]
    pub fn is_official(&self) -> bool {
        self.to_string() == OFFICIAL_REPOSITORY
    }

    /// Validate a user-supplied repository string without building a value.
    ///
    /// Matches the signature expected by text prompts.
    pub fn validate(input: &str) -> Result<(), String> {
        input.parse::<Self>().map(|_| ()).map_err(|e| e.to_string())
    }
}

impl FromStr for Repository {
    type Err = ApmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = |reason: &str| ApmError::InvalidRepository {
            repo: trimmed.to_string(),
            reason: reason.to_string(),
        };

        let (owner, name) = trimmed.split_once('/').ok_or_else(|| invalid("expected owner/repo"))?;
        if name.contains('/') {
            return Err(invalid("expected exactly one '/'"));
        }
        if !is_valid_repo_part(owner) || !is_valid_repo_part(name) {
            return Err(invalid("owner and repo may only contain letters, digits, '_', '.' and '-'"));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Release lookups and asset downloads over a [`Transport`].
pub struct ReleaseClient<T> {
    transport: T,
    api_base: String,
    major_version: u64,
}

impl<T: Transport> ReleaseClient<T> {
    /// Client against the public GitHub API for this tool's major version.
    pub fn new(transport: T) -> Self {
        Self::with_api_base(transport, GITHUB_API_BASE)
    }

    pub fn with_api_base(transport: T, api_base: impl Into<String>) -> Self {
        Self {
            transport,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            major_version: TOOL_MAJOR_VERSION,
        }
    }

    /// Override the major version used to filter official releases.
    #[must_use]
    pub fn with_major_version(mut self, major: u64) -> Self {
        self.major_version = major;
        self
    }

    #[must_use]
    pub const fn major_version(&self) -> u64 {
        self.major_version
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// All releases of `repo`, newest first as served by GitHub.
    ///
    /// # Errors
    ///
    /// [`ApmError::NetworkError`] for transport failures, including a missing
    /// (or inaccessible private) repository.
    pub async fn list_releases(&self, repo: &Repository) -> Result<Vec<Release>, ApmError> {
        let url = format!("{}/repos/{repo}/releases?per_page={RELEASES_PER_PAGE}", self.api_base);
        debug!("Listing releases for {repo}");

        let Some(value) = self.transport.get_json(&url).await? else {
            let hint = if self.transport.is_authenticated() {
                "repository not found or the token has no access to it (HTTP 404)"
            } else {
                "repository not found (HTTP 404); private repositories need GITHUB_TOKEN or 'gh auth login'"
            };
            return Err(ApmError::NetworkError {
                target: repo.to_string(),
                reason: hint.to_string(),
            });
        };

        let releases: Vec<Release> =
            serde_json::from_value(value).map_err(|e| ApmError::NetworkError {
                target: url.clone(),
                reason: format!("unexpected response shape: {e}"),
            })?;
        debug!("Found {} releases in {repo}", releases.len());
        Ok(releases)
    }

    /// Official releases whose tag's major version equals this tool's major.
    pub async fn official_releases(&self) -> Result<Vec<Release>, ApmError> {
        let releases = self.list_releases(&Repository::official()).await?;
        Ok(self.filter_to_major(releases))
    }

    /// Every release of a custom repository; no filtering is applied.
    pub async fn custom_releases(&self, repo: &Repository) -> Result<Vec<Release>, ApmError> {
        let releases = self.list_releases(repo).await?;
        if releases.is_empty() {
            warn!("Repository {repo} has no releases");
        }
        Ok(releases)
    }

    fn filter_to_major(&self, releases: Vec<Release>) -> Vec<Release> {
        releases
            .into_iter()
            .filter(|r| {
                parse_tag(&r.tag_name).is_some_and(|t| t.base_version.major == self.major_version)
            })
            .collect()
    }

    /// A single release by tag.
    ///
    /// # Errors
    ///
    /// [`ApmError::ReleaseNotFound`] when the tag does not exist.
    pub async fn fetch_release(&self, repo: &Repository, tag: &str) -> Result<Release, ApmError> {
        let url = format!("{}/repos/{repo}/releases/tags/{tag}", self.api_base);
        let value = self.transport.get_json(&url).await?.ok_or_else(|| {
            ApmError::ReleaseNotFound {
                repo: repo.to_string(),
                tag: tag.to_string(),
            }
        })?;

        serde_json::from_value(value).map_err(|e| ApmError::NetworkError {
            target: url,
            reason: format!("unexpected response shape: {e}"),
        })
    }

    /// Download, decode and validate the release manifest.
    ///
    /// # Errors
    ///
    /// - [`ApmError::ManifestMissing`] when the release has no manifest asset
    /// - [`ApmError::ManifestInvalid`] for bad encoding or failed validation
    /// - [`ApmError::DownloadFailed`] when the asset cannot be fetched
    pub async fn fetch_manifest(&self, release: &Release) -> Result<ReleaseManifest, ApmError> {
        let asset = release.find_manifest_asset().ok_or_else(|| ApmError::ManifestMissing {
            tag: release.tag_name.clone(),
        })?;

        let bytes = self.download_asset(asset).await?;
        let manifest = ReleaseManifest::from_slice(&bytes, &release.tag_name)?;
        debug!(
            "Manifest for {} lists {} assistant(s)",
            release.tag_name,
            manifest.assistants.len()
        );
        Ok(manifest)
    }

    /// Download an asset and check it against the advertised size and digest.
    pub async fn download_asset(&self, asset: &Asset) -> Result<Vec<u8>, ApmError> {
        debug!("Downloading {} ({} bytes)", asset.name, asset.size_bytes);
        let bytes = self.transport.get_asset(asset).await?;

        if asset.size_bytes > 0 && bytes.len() as u64 != asset.size_bytes {
            return Err(ApmError::DownloadFailed {
                url: asset.download_url.clone(),
                reason: format!("expected {} bytes, received {}", asset.size_bytes, bytes.len()),
            });
        }

        if let Some(digest) = &asset.digest {
            verification::verify_digest(&bytes, digest).map_err(|reason| {
                ApmError::DownloadFailed {
                    url: asset.download_url.clone(),
                    reason,
                }
            })?;
        }

        Ok(bytes)
    }
}
