use serde::{Deserialize, Serialize};
use url::Url;

/// How tightly discovered links are bound to the root.
///
/// `Origin` (the default) admits anything on the same scheme+host+port.
/// `PathPrefix` additionally requires the resolved path to start with the
/// root's path; it silently drops valid same-site pages outside the root's
/// subdirectory, so it is opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScopeGranularity {
    #[default]
    Origin,
    PathPrefix,
}

impl ScopeGranularity {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "origin" => Some(ScopeGranularity::Origin),
            "path-prefix" | "path_prefix" => Some(ScopeGranularity::PathPrefix),
            _ => None,
        }
    }
}

/// Immutable root context for one crawl run: decides which candidate links
/// are eligible for traversal.
#[derive(Debug, Clone)]
pub struct Scope {
    origin: String,
    root_path: String,
    granularity: ScopeGranularity,
}

impl Scope {
    pub fn new(root: &Url, granularity: ScopeGranularity) -> Self {
        Self {
            origin: root.origin().ascii_serialization(),
            root_path: root.path().to_string(),
            granularity,
        }
    }

    /// Resolve a raw href against the page it appeared on and admit it into
    /// scope, or reject it. Fragments are stripped before any comparison so
    /// `/page#a` and `/page#b` collapse to one URL.
    pub fn resolve(&self, href: &str, base: &Url) -> Option<Url> {
        let href = href.trim();
        // Empty and bare-fragment hrefs are self-links.
        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        let mut resolved = base.join(href).ok()?;

        // mailto:, tel:, javascript: and anything else non-http(s).
        if !matches!(resolved.scheme(), "http" | "https") {
            return None;
        }

        resolved.set_fragment(None);

        if !self.admits(&resolved) {
            return None;
        }

        Some(resolved)
    }

    /// Scope predicate for an already-absolute URL (sitemap entries go
    /// through here without href resolution).
    pub fn admits(&self, url: &Url) -> bool {
        if url.origin().ascii_serialization() != self.origin {
            return false;
        }

        match self.granularity {
            ScopeGranularity::Origin => true,
            ScopeGranularity::PathPrefix => url.path().starts_with(&self.root_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(root: &str, granularity: ScopeGranularity) -> (Scope, Url) {
        let root = Url::parse(root).unwrap();
        (Scope::new(&root, granularity), root)
    }

    #[test]
    fn resolves_relative_hrefs_against_base() {
        let (scope, root) = scope("https://example.com/", ScopeGranularity::Origin);
        let resolved = scope.resolve("/about", &root).unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/about");

        let base = Url::parse("https://example.com/blog/").unwrap();
        let resolved = scope.resolve("post-1", &base).unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/blog/post-1");
    }

    #[test]
    fn rejects_non_http_schemes() {
        let (scope, root) = scope("https://example.com/", ScopeGranularity::Origin);
        assert!(scope.resolve("mailto:x@example.com", &root).is_none());
        assert!(scope.resolve("tel:+15551234", &root).is_none());
        assert!(scope.resolve("javascript:void(0)", &root).is_none());
        assert!(scope.resolve("ftp://example.com/file", &root).is_none());
    }

    #[test]
    fn rejects_empty_and_fragment_only_hrefs() {
        let (scope, root) = scope("https://example.com/", ScopeGranularity::Origin);
        assert!(scope.resolve("", &root).is_none());
        assert!(scope.resolve("   ", &root).is_none());
        assert!(scope.resolve("#section", &root).is_none());
    }

    #[test]
    fn fragment_variants_collapse() {
        let (scope, root) = scope("https://example.com/", ScopeGranularity::Origin);
        let a = scope.resolve("/page#a", &root).unwrap();
        let b = scope.resolve("/page#b", &root).unwrap();
        let plain = scope.resolve("/page", &root).unwrap();
        assert_eq!(a, plain);
        assert_eq!(b, plain);
    }

    #[test]
    fn rejects_other_hosts_and_ports() {
        let (scope, root) = scope("https://example.com/", ScopeGranularity::Origin);
        assert!(scope.resolve("https://other.com/b", &root).is_none());
        assert!(scope.resolve("https://sub.example.com/", &root).is_none());
        assert!(scope.resolve("https://example.com:8443/", &root).is_none());
        assert!(scope.resolve("http://example.com/", &root).is_none());
    }

    #[test]
    fn path_prefix_mode_restricts_to_subdirectory() {
        let (scope, _) = scope("https://example.com/docs/", ScopeGranularity::PathPrefix);
        let base = Url::parse("https://example.com/docs/").unwrap();
        assert!(scope.resolve("/docs/intro", &base).is_some());
        assert!(scope.resolve("/pricing", &base).is_none());
    }

    #[test]
    fn origin_mode_admits_whole_site() {
        let (scope, _) = scope("https://example.com/docs/", ScopeGranularity::Origin);
        let base = Url::parse("https://example.com/docs/").unwrap();
        assert!(scope.resolve("/pricing", &base).is_some());
    }
}
