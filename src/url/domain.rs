use url::Url;

/// Extracts the lowercase host of a URL, without port
///
/// Returns `None` for URLs that carry no host (e.g. `mailto:`).
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_strips_port() {
        let url = Url::parse("http://127.0.0.1:4010/listing").unwrap();
        assert_eq!(extract_domain(&url), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_extract_lowercases_host() {
        let url = Url::parse("https://WWW.FireMountainGems.com/beads").unwrap();
        assert_eq!(
            extract_domain(&url),
            Some("www.firemountaingems.com".to_string())
        );
    }

    #[test]
    fn test_no_host() {
        let url = Url::parse("mailto:orders@beads.test").unwrap();
        assert_eq!(extract_domain(&url), None);
    }
}
