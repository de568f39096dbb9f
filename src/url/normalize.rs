use crate::UrlError;
use url::Url;

/// Query parameters that never change which page is served
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "srsltid"];

/// Builds the frontier dedup key of a URL
///
/// The scheme and `www.` are kept, so the key still names a fetchable URL.
/// Steps: lowercase the host, collapse dot segments and duplicate slashes,
/// drop a trailing slash (except the root), drop the fragment, drop tracking
/// parameters and sort the rest.
///
/// # Examples
///
/// ```
/// use bead_harvest::url::normalize_url;
///
/// let url = normalize_url("https://Shop.TEST/delica/?page=2&utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://shop.test/delica?page=2");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    let path = normalize_path(url.path());
    url.set_path(&path);
    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort();

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_scheme() {
        let result = normalize_url("http://127.0.0.1:9000/listing").unwrap();
        assert_eq!(result.as_str(), "http://127.0.0.1:9000/listing");
    }

    #[test]
    fn test_trailing_slash_removed() {
        let result = normalize_url("https://shop.test/delica/").unwrap();
        assert_eq!(result.as_str(), "https://shop.test/delica");
    }

    #[test]
    fn test_root_kept() {
        let result = normalize_url("https://shop.test").unwrap();
        assert_eq!(result.as_str(), "https://shop.test/");
    }

    #[test]
    fn test_fragment_removed() {
        let result = normalize_url("https://shop.test/delica#grid").unwrap();
        assert_eq!(result.as_str(), "https://shop.test/delica");
    }

    #[test]
    fn test_query_sorted_and_tracking_dropped() {
        let result =
            normalize_url("https://shop.test/delica?sz=48&start=96&utm_medium=mail").unwrap();
        assert_eq!(result.as_str(), "https://shop.test/delica?start=96&sz=48");
    }

    #[test]
    fn test_only_tracking_params() {
        let result = normalize_url("https://shop.test/delica?gclid=abc").unwrap();
        assert_eq!(result.as_str(), "https://shop.test/delica");
    }

    #[test]
    fn test_dot_segments() {
        let result = normalize_url("https://shop.test/a/../b/./c").unwrap();
        assert_eq!(result.as_str(), "https://shop.test/b/c");
    }

    #[test]
    fn test_rejects_other_scheme() {
        assert!(matches!(
            normalize_url("ftp://shop.test/file"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(normalize_url("not a url"), Err(UrlError::Parse(_))));
    }
}
