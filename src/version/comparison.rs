//! Release selection over template tags.
//!
//! Selection never crosses base versions on its own:
//! [`select_latest_compatible`] stays within one base version, while
//! [`select_latest_overall`] only feeds the "a newer base version exists" notice.

use super::{TemplateTag, parse_tag};
use crate::release::Release;
use semver::Version;
use std::cmp::Ordering;

/// Full semantic-version precedence between two base versions.
///
/// A release sorts above its pre-releases; pre-release identifiers compare
/// left to right, numeric ones numerically and below alphanumeric ones, and a
/// shorter identifier list sorts below a longer one sharing its prefix.
#[must_use]
pub fn compare_base_version(a: &Version, b: &Version) -> Ordering {
    a.cmp_precedence(b)
}

/// Total order over template tags: base version first, then build number.
#[must_use]
pub fn compare_tags(a: &TemplateTag, b: &TemplateTag) -> Ordering {
    compare_base_version(&a.base_version, &b.base_version)
        .then(a.build_number.cmp(&b.build_number))
}

/// Releases whose tags parse as template tags, paired with the parsed tag.
pub fn template_releases(releases: &[Release]) -> impl Iterator<Item = (&Release, TemplateTag)> {
    releases.iter().filter_map(|r| parse_tag(&r.tag_name).map(|t| (r, t)))
}

/// Highest build among releases sharing `current_base`.
#[must_use]
pub fn select_latest_compatible<'a>(
    releases: &'a [Release],
    current_base: &Version,
) -> Option<&'a Release> {
    template_releases(releases)
        .filter(|(_, tag)| &tag.base_version == current_base)
        .max_by_key(|(_, tag)| tag.build_number)
        .map(|(release, _)| release)
}

/// Highest template tag across all base versions.
///
/// Informational only; never drives an automatic upgrade.
#[must_use]
pub fn select_latest_overall(releases: &[Release]) -> Option<TemplateTag> {
    template_releases(releases).map(|(_, tag)| tag).max_by(compare_tags)
}

/// Highest stable template release, used when no base version is pinned yet.
#[must_use]
pub fn select_latest_stable(releases: &[Release]) -> Option<&Release> {
    template_releases(releases)
        .filter(|(_, tag)| tag.is_stable())
        .max_by(|(_, a), (_, b)| compare_tags(a, b))
        .map(|(release, _)| release)
}
