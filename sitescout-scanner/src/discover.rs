use crate::crawler::{Crawler, ProgressCallback};
use crate::error::{Result, ScoutError};
use crate::result::{Discovery, Strategy};
use crate::scope::{Scope, ScopeGranularity};
use crate::sitemap::{self, SitemapHeuristic};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::info;
use url::Url;

/// Crawl orchestrator: validates the root, prefers sitemap expansion, and
/// falls back to link-following traversal when no sitemap exists. Each run
/// owns its visited state exclusively; concurrent runs share nothing.
pub struct Discoverer {
    crawler: Crawler,
    workers: usize,
    granularity: ScopeGranularity,
    heuristic: SitemapHeuristic,
    use_sitemap: bool,
}

impl Discoverer {
    pub fn new() -> Self {
        Self::with_timeout(5)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            crawler: Crawler::with_timeout(timeout_secs),
            workers: 10,
            granularity: ScopeGranularity::default(),
            heuristic: SitemapHeuristic::default(),
            use_sitemap: true,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_granularity(mut self, granularity: ScopeGranularity) -> Self {
        self.granularity = granularity;
        self.crawler = self.crawler.with_granularity(granularity);
        self
    }

    pub fn with_heuristic(mut self, heuristic: SitemapHeuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Skip sitemap detection entirely and always traverse.
    pub fn with_sitemap_disabled(mut self) -> Self {
        self.use_sitemap = false;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.crawler = self.crawler.with_deadline(deadline);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.crawler = self.crawler.with_progress_callback(callback);
        self
    }

    pub async fn run(&self, root: &str) -> Result<Discovery> {
        let root_url = parse_root(root)?;
        let started = Instant::now();

        if self.use_sitemap
            && let Some(sitemap_url) =
                sitemap::find_sitemap(self.crawler.client(), &root_url, self.heuristic).await?
        {
            info!("Using sitemap strategy for {}", root_url);

            // A confirmed-but-broken sitemap propagates as a hard failure
            // rather than silently falling back.
            let raw = sitemap::expand(self.crawler.client(), &sitemap_url).await?;

            let scope = Scope::new(&root_url, self.granularity);
            let urls = dedup(raw.into_iter().filter(|loc| {
                Url::parse(loc)
                    .map(|parsed| {
                        matches!(parsed.scheme(), "http" | "https") && scope.admits(&parsed)
                    })
                    .unwrap_or(false)
            }));

            return Ok(Discovery {
                root: root_url.to_string(),
                strategy: Strategy::Sitemap,
                sitemap: Some(sitemap_url.to_string()),
                urls,
                failures: Vec::new(),
                duration: started.elapsed(),
            });
        }

        info!("No sitemap found for {}, traversing links", root_url);
        let traversal = self.crawler.crawl(&root_url, self.workers).await?;

        Ok(Discovery {
            root: root_url.to_string(),
            strategy: Strategy::Traversal,
            sitemap: None,
            // Traversal admits each URL once already; boundary dedup is
            // defense in depth.
            urls: dedup(traversal.urls),
            failures: traversal.failures,
            duration: started.elapsed(),
        })
    }
}

impl Default for Discoverer {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate the user-supplied root: a syntactically valid absolute URL with
/// an http(s) scheme. Surfaced before any I/O happens. The fragment is
/// stripped so the root compares equal to its own traversal entry.
pub fn parse_root(root: &str) -> Result<Url> {
    let trimmed = root.trim();
    if trimmed.is_empty() {
        return Err(ScoutError::InvalidUrl("root URL is empty".to_string()));
    }

    let mut url = Url::parse(trimmed)
        .map_err(|e| ScoutError::InvalidUrl(format!("'{}': {}", trimmed, e)))?;
    url.set_fragment(None);

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ScoutError::InvalidUrl(format!(
            "'{}': unsupported scheme '{}'",
            trimmed,
            url.scheme()
        )));
    }

    Ok(url)
}

/// Order-preserving dedup. Idempotent: dedup(dedup(x)) == dedup(x).
pub fn dedup<I: IntoIterator<Item = String>>(urls: I) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn html(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/html")
            .set_body_bytes(format!("<html><body>{}</body></html>", body).into_bytes())
    }

    fn xml(body: String) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("content-type", "application/xml")
            .set_body_bytes(body.into_bytes())
    }

    #[test]
    fn rejects_bad_roots_before_any_io() {
        assert!(matches!(parse_root(""), Err(ScoutError::InvalidUrl(_))));
        assert!(matches!(
            parse_root("not a url"),
            Err(ScoutError::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_root("ftp://example.com/"),
            Err(ScoutError::InvalidUrl(_))
        ));
        assert!(parse_root("https://example.com/").is_ok());
    }

    #[test]
    fn root_fragment_is_stripped() {
        let url = parse_root("https://example.com/#top").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[tokio::test]
    async fn fragment_root_matches_its_own_entry() {
        let server = MockServer::start().await;
        let base = server.uri();

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html(r#"<a href="/a">A</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(html("leaf"))
            .mount(&server)
            .await;

        let discovery = Discoverer::new()
            .run(&format!("{base}/#top"))
            .await
            .unwrap();

        assert_eq!(discovery.root, format!("{base}/"));
        assert_eq!(discovery.urls[0], discovery.root);
    }

    #[test]
    fn dedup_is_idempotent_and_order_preserving() {
        let input = vec![
            "b".to_string(),
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "a".to_string(),
        ];
        let once = dedup(input);
        assert_eq!(once, vec!["b", "a", "c"]);
        let twice = dedup(once.clone());
        assert_eq!(twice, once);
    }

    #[tokio::test]
    async fn sitemap_strategy_is_authoritative() {
        let server = MockServer::start().await;
        let base = server.uri();

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html(
                r#"<a href="/sitemap.xml">Sitemap</a><a href="/never-crawled">x</a>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(xml(format!(
                r#"<urlset>
                    <url><loc>{base}/one</loc></url>
                    <url><loc>{base}/two</loc></url>
                    <url><loc>{base}/one</loc></url>
                    <url><loc>https://elsewhere.example.net/out-of-scope</loc></url>
                </urlset>"#
            )))
            .mount(&server)
            .await;

        let discovery = Discoverer::new().run(&format!("{base}/")).await.unwrap();

        assert_eq!(discovery.strategy, Strategy::Sitemap);
        assert_eq!(
            discovery.urls,
            vec![format!("{base}/one"), format!("{base}/two")]
        );
        assert!(discovery.failures.is_empty());
        // The linked page was never traversed.
        assert!(!discovery.urls.contains(&format!("{base}/never-crawled")));
    }

    #[tokio::test]
    async fn empty_sitemap_suppresses_traversal() {
        let server = MockServer::start().await;
        let base = server.uri();

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html(r#"<a href="/sitemap.xml">Sitemap</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(xml("<urlset></urlset>".to_string()))
            .mount(&server)
            .await;

        let discovery = Discoverer::new().run(&format!("{base}/")).await.unwrap();

        assert_eq!(discovery.strategy, Strategy::Sitemap);
        assert!(discovery.urls.is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_traversal_without_sitemap() {
        let server = MockServer::start().await;
        let base = server.uri();

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html(r#"<a href="/a">A</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(html("leaf"))
            .mount(&server)
            .await;

        let discovery = Discoverer::new().run(&format!("{base}/")).await.unwrap();

        assert_eq!(discovery.strategy, Strategy::Traversal);
        assert_eq!(discovery.urls, vec![format!("{base}/"), format!("{base}/a")]);
    }

    #[tokio::test]
    async fn confirmed_broken_sitemap_fails_the_run() {
        let server = MockServer::start().await;
        let base = server.uri();

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html(r#"<a href="/sitemap.xml">Sitemap</a><a href="/a">A</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = Discoverer::new()
            .run(&format!("{base}/"))
            .await
            .unwrap_err();

        assert!(matches!(err, ScoutError::SitemapUnavailable { .. }));
    }

    #[tokio::test]
    async fn sitemap_can_be_disabled() {
        let server = MockServer::start().await;
        let base = server.uri();

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html(r#"<a href="/sitemap.xml">Sitemap</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(xml(format!(
                "<urlset><url><loc>{base}/from-sitemap</loc></url></urlset>"
            )))
            .mount(&server)
            .await;

        let discovery = Discoverer::new()
            .with_sitemap_disabled()
            .run(&format!("{base}/"))
            .await
            .unwrap();

        assert_eq!(discovery.strategy, Strategy::Traversal);
        // Traversal visits the sitemap link as a page, not as a sitemap.
        assert!(!discovery.urls.contains(&format!("{base}/from-sitemap")));
    }

    #[tokio::test]
    async fn spec_example_scope_filtering() {
        // Root links to /a, /a#section, mailto:, and an off-site URL;
        // exactly root and /a survive.
        let server = MockServer::start().await;
        let base = server.uri();

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html(
                r#"<a href="/a">A</a>
                   <a href="/a#section">A section</a>
                   <a href="mailto:x@example.com">mail</a>
                   <a href="https://other.example.net/b">other</a>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(html("leaf"))
            .mount(&server)
            .await;

        let discovery = Discoverer::new().run(&format!("{base}/")).await.unwrap();

        assert_eq!(discovery.urls, vec![format!("{base}/"), format!("{base}/a")]);
    }
}
