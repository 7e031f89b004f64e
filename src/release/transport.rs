//! HTTP access to the GitHub API.
//!
//! [`Transport`] is the seam the release client talks through. The production
//! implementation, [`GitHubTransport`], wraps a `reqwest` client and attaches a
//! bearer token when one is available. A missing token is not an error, it
//! only lowers the API rate limit.

use crate::constants::{
    API_REQUEST_TIMEOUT, ASSET_DOWNLOAD_TIMEOUT, GITHUB_TOKEN_ENV, USER_AGENT,
};
use crate::core::ApmError;
use crate::release::Asset;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap};
use serde_json::Value;
use std::future::Future;
use tracing::debug;

/// Authenticated HTTP GET against GitHub.
pub trait Transport: Sync {
    /// GET a JSON document.
    ///
    /// Returns `Ok(None)` for HTTP 404 so callers can map absence to their
    /// own error kind. Every other failure is [`ApmError::NetworkError`].
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Option<Value>, ApmError>> + Send;

    /// Download the raw bytes of a release asset.
    ///
    /// Failures are [`ApmError::DownloadFailed`].
    fn get_asset(&self, asset: &Asset) -> impl Future<Output = Result<Vec<u8>, ApmError>> + Send;

    /// Whether requests carry a token.
    fn is_authenticated(&self) -> bool;
}

/// Resolve a GitHub token from the environment or the `gh` CLI.
///
/// `GITHUB_TOKEN` wins when set and non-empty. Otherwise, if `gh` is on the
/// PATH, the output of `gh auth token` is used.
pub async fn resolve_token() -> Option<String> {
    if let Ok(token) = std::env::var(GITHUB_TOKEN_ENV) {
        let token = token.trim();
        if !token.is_empty() {
            debug!("Using GitHub token from {GITHUB_TOKEN_ENV}");
            return Some(token.to_string());
        }
    }

    let gh = which::which("gh").ok()?;
    let output = tokio::process::Command::new(gh).args(["auth", "token"]).output().await.ok()?;
    if !output.status.success() {
        debug!("'gh auth token' failed; continuing unauthenticated");
        return None;
    }

    let token = String::from_utf8(output.stdout).ok()?.trim().to_string();
    if token.is_empty() {
        None
    } else {
        debug!("Using GitHub token from gh CLI");
        Some(token)
    }
}

/// Human-readable reason for a non-success HTTP status.
#[must_use]
pub fn status_reason(status: StatusCode, headers: &HeaderMap, authenticated: bool) -> String {
    let rate_limited = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");

    match status.as_u16() {
        404 if authenticated => "HTTP 404: not found, or the token has no access".to_string(),
        404 => "HTTP 404: not found (private repositories need GITHUB_TOKEN or 'gh auth login')"
            .to_string(),
        401 => "HTTP 401: GitHub token is invalid or expired".to_string(),
        403 | 429 if rate_limited => {
            let reset = headers
                .get("x-ratelimit-reset")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<i64>().ok())
                .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
                .map(|t| format!(", resets at {}", t.format("%H:%M:%S UTC")))
                .unwrap_or_default();
            format!("HTTP {}: GitHub API rate limit exceeded{reset}", status.as_u16())
        }
        403 => "HTTP 403: access forbidden".to_string(),
        _ => format!("HTTP {status}"),
    }
}

/// `reqwest`-backed [`Transport`] for api.github.com.
#[derive(Debug, Clone)]
pub struct GitHubTransport {
    client: reqwest::Client,
    token: Option<String>,
}

impl GitHubTransport {
    /// Build a transport using whatever token [`resolve_token`] finds.
    pub async fn from_env() -> Result<Self, ApmError> {
        Self::with_token(resolve_token().await)
    }

    pub fn with_token(token: Option<String>) -> Result<Self, ApmError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build().map_err(|e| {
            ApmError::NetworkError {
                target: "HTTP client".to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            client,
            token,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}

impl Transport for GitHubTransport {
    async fn get_json(&self, url: &str) -> Result<Option<Value>, ApmError> {
        let network_error = |reason: String| ApmError::NetworkError {
            target: url.to_string(),
            reason,
        };

        let request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .timeout(API_REQUEST_TIMEOUT);
        let response =
            self.authorize(request).send().await.map_err(|e| network_error(describe(&e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("GET {url} returned 404");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(network_error(status_reason(
                status,
                response.headers(),
                self.is_authenticated(),
            )));
        }

        response
            .json::<Value>()
            .await
            .map(Some)
            .map_err(|e| network_error(format!("invalid JSON response: {}", describe(&e))))
    }

    async fn get_asset(&self, asset: &Asset) -> Result<Vec<u8>, ApmError> {
        // Private repositories only serve assets through the API endpoint
        let (url, accept) = if self.token.is_some() && !asset.api_url.is_empty() {
            (asset.api_url.as_str(), "application/octet-stream")
        } else {
            (asset.download_url.as_str(), "*/*")
        };
        let download_error = |reason: String| ApmError::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        let request = self.client.get(url).header(ACCEPT, accept).timeout(ASSET_DOWNLOAD_TIMEOUT);
        let response =
            self.authorize(request).send().await.map_err(|e| download_error(describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(status_reason(
                status,
                response.headers(),
                self.is_authenticated(),
            )));
        }

        let bytes = response.bytes().await.map_err(|e| download_error(describe(&e)))?;
        Ok(bytes.to_vec())
    }

    fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}
