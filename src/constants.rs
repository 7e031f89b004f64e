//! Global constants used throughout the APM codebase.
//!
//! Well-known repository coordinates, on-disk paths, and network timeouts
//! live here so the rest of the engine never hardcodes them.

use std::time::Duration;

/// Repository that publishes the official template releases.
pub const OFFICIAL_REPOSITORY: &str = "sdi2200262/agentic-project-management";

/// Base URL of the GitHub REST API.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Name of the release asset carrying the machine-readable manifest.
pub const MANIFEST_ASSET_NAME: &str = "apm-release.json";

/// Manifest format version this engine understands.
///
/// Manifests declaring any other version are rejected outright.
pub const SUPPORTED_MANIFEST_FORMAT: &str = "1.0";

/// Number of releases requested per listing page.
pub const RELEASES_PER_PAGE: u32 = 100;

/// Timeout for GitHub API calls (30 seconds).
pub const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for bundle asset downloads (120 seconds).
///
/// Covers the redirect to object storage as well as the body transfer.
pub const ASSET_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// User-Agent header sent on every request.
pub const USER_AGENT: &str = concat!("apm-cli/", env!("CARGO_PKG_VERSION"));

/// Environment variable holding a GitHub token.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Environment variable overriding the global config location.
pub const CONFIG_PATH_ENV: &str = "APM_CONFIG_PATH";

/// Project-local directory owned by the tool.
pub const APM_DIR: &str = ".apm";

/// Installation record, relative to the project root.
pub const METADATA_FILE: &str = ".apm/metadata.json";

/// Path prefix of the shared scaffold inside every bundle archive.
pub const SCAFFOLD_PREFIX: &str = ".apm/";

/// Tool-owned part of the scaffold, replaced wholesale on every update.
///
/// Everything else under [`SCAFFOLD_PREFIX`] is user-authored once written.
pub const MANAGED_SCAFFOLD_DIR: &str = ".apm/guides";

/// Prefix of backup holding directories created under [`APM_DIR`].
pub const BACKUP_DIR_PREFIX: &str = "backup-";

/// Major version of this tool; official releases of other majors are ignored.
pub const TOOL_MAJOR_VERSION: u64 = 1;
