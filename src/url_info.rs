/// URL classification for Only One Tab
use url::Url;

use crate::error::ClassifyError;

/// Schemes that belong to the browser itself; tabs showing them are never
/// deduplicated or counted.
const PRIVILEGED_SCHEMES: &[&str] = &[
    "chrome",
    "chrome-extension",
    "chrome-untrusted",
    "edge",
    "about",
    "devtools",
    "view-source",
];

/// What a freshly created tab shows before it navigates anywhere.
const NEW_TAB_PLACEHOLDERS: &[&str] = &[
    "chrome://newtab/",
    "edge://newtab/",
    "about:newtab",
    "about:blank",
];

/// The parts of a URL used to compare tabs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlInfo {
    /// Lowercase hostname, empty for URLs without a host (e.g. `file:///`)
    pub host: String,
    /// Path component only, without query or fragment
    pub path: String,
    /// The URL exactly as the browser reported it
    pub raw: String,
}

/// Parse a URL into host, path and the original text
///
/// Examples:
/// - https://www.google.com/search?q=rust → host `www.google.com`, path `/search`
/// - https://GitHub.com → host `github.com`, path `/`
/// - not-a-url → error (no scheme)
pub fn classify(url: &str) -> Result<UrlInfo, ClassifyError> {
    if url.trim().is_empty() {
        return Err(ClassifyError::Empty);
    }

    let parsed = Url::parse(url).map_err(|source| ClassifyError::Malformed {
        url: url.to_string(),
        source,
    })?;

    Ok(UrlInfo {
        host: parsed.host_str().unwrap_or_default().to_lowercase(),
        path: parsed.path().to_string(),
        raw: url.to_string(),
    })
}

/// Check whether a URL belongs to a browser-internal page
pub fn is_privileged(url: &str) -> bool {
    url.split_once(':')
        .map_or(false, |(scheme, _)| {
            PRIVILEGED_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str())
        })
}

/// Check whether a URL is the empty new-tab page
pub fn is_new_tab_placeholder(url: &str) -> bool {
    NEW_TAB_PLACEHOLDERS.contains(&url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_basic() {
        let info = classify("https://www.google.com/search?q=rust#top").unwrap();
        assert_eq!(info.host, "www.google.com");
        assert_eq!(info.path, "/search");
        assert_eq!(info.raw, "https://www.google.com/search?q=rust#top");
    }

    #[test]
    fn test_classify_lowercases_host() {
        let info = classify("https://GitHub.COM/Rust-Lang").unwrap();
        assert_eq!(info.host, "github.com");
        // Paths keep their case
        assert_eq!(info.path, "/Rust-Lang");
    }

    #[test]
    fn test_classify_root_path() {
        assert_eq!(classify("https://example.com").unwrap().path, "/");
    }

    #[test]
    fn test_classify_strips_port() {
        assert_eq!(classify("http://localhost:3000/app").unwrap().host, "localhost");
    }

    #[test]
    fn test_classify_hostless_url() {
        let info = classify("file:///home/user/notes.txt").unwrap();
        assert_eq!(info.host, "");
        assert_eq!(info.path, "/home/user/notes.txt");
    }

    #[test]
    fn test_classify_failures() {
        assert_eq!(classify(""), Err(ClassifyError::Empty));
        assert_eq!(classify("   "), Err(ClassifyError::Empty));
        assert!(matches!(
            classify("not-a-url"),
            Err(ClassifyError::Malformed { .. })
        ));
        assert!(classify("https://").is_err());
    }

    #[test]
    fn test_is_privileged() {
        assert!(is_privileged("chrome://settings/"));
        assert!(is_privileged("chrome-extension://abcdef/options.html"));
        assert!(is_privileged("about:blank"));
        assert!(is_privileged("edge://newtab/"));
        assert!(!is_privileged("https://chrome.google.com/webstore"));
        assert!(!is_privileged("http://example.com"));
        assert!(!is_privileged("not-a-url"));
    }

    #[test]
    fn test_is_new_tab_placeholder() {
        assert!(is_new_tab_placeholder("chrome://newtab/"));
        assert!(is_new_tab_placeholder("about:blank"));
        assert!(!is_new_tab_placeholder("chrome://settings/"));
        assert!(!is_new_tab_placeholder("https://example.com/"));
    }
}
