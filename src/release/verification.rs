//! Content digest checks for downloaded assets.
//!
//! GitHub publishes a `sha256:<hex>` digest for release assets. When present,
//! downloaded bytes must match it before they are extracted anywhere.

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// `sha256:<lowercase hex>` digest of `bytes`.
#[must_use]
pub fn sha256_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

/// Compare `bytes` against an expected `algorithm:hex` digest.
///
/// Digests using an algorithm other than sha256 are skipped with a warning.
pub fn verify_digest(bytes: &[u8], expected: &str) -> Result<(), String> {
    let Some((algorithm, _)) = expected.split_once(':') else {
        return Err(format!("malformed digest '{expected}'"));
    };
    if !algorithm.eq_ignore_ascii_case("sha256") {
        warn!("Skipping verification for unsupported digest algorithm '{algorithm}'");
        return Ok(());
    }

    let actual = sha256_digest(bytes);
    // Case-insensitive comparison (hex may be uppercase)
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(format!("digest mismatch: expected {expected}, got {actual}"));
    }

    debug!("Digest verified: {actual}");
    Ok(())
}
