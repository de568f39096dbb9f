//! URL handling for Bead-Harvest
//!
//! Frontier dedup keys, host extraction and domain allowlist matching.

mod domain;
mod matcher;
mod normalize;

use ::url::Url;

pub use domain::extract_domain;
pub use matcher::matches_wildcard;
pub use normalize::normalize_url;

/// Returns true when the URL's host is covered by one of the allowlist patterns
///
/// Only http and https URLs are ever allowed.
///
/// # Arguments
///
/// * `url` - The candidate URL
/// * `allowlist` - Domain patterns, exact or `*.`-prefixed
pub fn is_allowed(url: &Url, allowlist: &[String]) -> bool {
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }

    match extract_domain(url) {
        Some(domain) => allowlist
            .iter()
            .any(|pattern| matches_wildcard(&pattern.to_lowercase(), &domain)),
        None => false,
    }
}
