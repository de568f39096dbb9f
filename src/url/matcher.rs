/// Checks if a domain matches an allowlist pattern
///
/// `"shop.test"` matches only itself; `"*.shop.test"` matches the bare
/// domain and any subdomain depth below it.
///
/// # Examples
///
/// ```
/// use bead_harvest::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.shop.test", "shop.test"));
/// assert!(matches_wildcard("*.shop.test", "www.shop.test"));
/// assert!(!matches_wildcard("shop.test", "www.shop.test"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}
