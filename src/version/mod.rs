//! Template release tags.
//!
//! Official releases are tagged `v<base-semver>+templates.<build>`, for example
//! `v0.5.1+templates.3`. The *base version* is the semantic version of the
//! template set; the *build number* counts successive template releases of that
//! base version.
//!
//! Tags that do not follow this shape are not errors: repositories carry plenty
//! of unrelated tags, so [`parse_tag`] returns `None` for them and callers filter
//! release lists without aborting.
//!
//! Builds are only ordered within one base version. Two tags with different base
//! versions belong to different upgrade lineages and compare as incomparable
//! ([`TemplateTag::compare_build`] returns `None`).
//!
//! ```rust
//! use apm_cli::version::parse_tag;
//! use std::cmp::Ordering;
//!
//! let a = parse_tag("v1.0.0+templates.1").unwrap();
//! let b = parse_tag("v1.0.0+templates.4").unwrap();
//! assert_eq!(a.compare_build(&b), Some(Ordering::Less));
//!
//! let c = parse_tag("v1.1.0+templates.1").unwrap();
//! assert_eq!(a.compare_build(&c), None);
//!
//! assert!(parse_tag("nightly").is_none());
//! ```

pub mod comparison;

pub use comparison::{
    compare_base_version, compare_tags, select_latest_compatible, select_latest_overall,
    select_latest_stable,
};

use regex::Regex;
use semver::Version;
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// Parsed `v<base>+templates.<build>` tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateTag {
    /// Semantic version of the template set, possibly with a pre-release suffix
    pub base_version: Version,
    /// Build number within `base_version`
    pub build_number: u64,
}

fn tag_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^v(\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?)\+templates\.(\d+)$").ok()
        })
        .as_ref()
}

/// Parse a release tag, returning `None` if it is not a template tag.
#[must_use]
pub fn parse_tag(tag: &str) -> Option<TemplateTag> {
    let captures = tag_pattern()?.captures(tag.trim())?;
    // semver rejects leading zeros and empty pre-release identifiers the regex lets through
    let base_version = Version::parse(captures.get(1)?.as_str()).ok()?;
    let build_number = captures.get(2)?.as_str().parse().ok()?;

    Some(TemplateTag {
        base_version,
        build_number,
    })
}

impl TemplateTag {
    /// Order two tags by build number.
    ///
    /// Returns `None` when the base versions differ.
    #[must_use]
    pub fn compare_build(&self, other: &Self) -> Option<Ordering> {
        if self.base_version != other.base_version {
            return None;
        }
        Some(self.build_number.cmp(&other.build_number))
    }

    /// True when the base version has no pre-release suffix.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.base_version.pre.is_empty()
    }
}

/// Partial order matching [`TemplateTag::compare_build`].
impl PartialOrd for TemplateTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare_build(other)
    }
}

impl fmt::Display for TemplateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}+templates.{}", self.base_version, self.build_number)
    }
}

/// True when `tag` parses and its base version has no pre-release suffix.
#[must_use]
pub fn is_stable(tag: &str) -> bool {
    parse_tag(tag).is_some_and(|t| t.is_stable())
}
