use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which discovery strategy produced a run's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    Sitemap,
    Traversal,
}

/// A page that was dispatched but could not be fetched or read.
/// The URL stays in the result set; it just contributes no outbound links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchFailure {
    pub url: String,
    pub reason: String,
}

/// Raw output of the traversal engine, before boundary dedup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Traversal {
    /// In-scope URLs in admission order.
    pub urls: Vec<String>,
    pub failures: Vec<FetchFailure>,
}

/// Final result of one crawl run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discovery {
    /// The normalized root URL that defined the run's scope.
    pub root: String,
    pub strategy: Strategy,
    /// The sitemap that was expanded, when the sitemap strategy ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sitemap: Option<String>,
    /// Deduplicated in-scope URLs, in stable discovery order.
    pub urls: Vec<String>,
    /// Per-URL diagnostics from the traversal path. Empty for sitemap runs.
    pub failures: Vec<FetchFailure>,
    pub duration: Duration,
}
