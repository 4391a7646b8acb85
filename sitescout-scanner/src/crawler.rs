use crate::error::{Result, ScoutError};
use crate::result::{FetchFailure, Traversal};
use crate::scope::{Scope, ScopeGranularity};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Link-following traversal engine: visits every in-scope page reachable
/// from the root, each at most once, using a bounded pool of async workers
/// drawing from a shared frontier queue.
pub struct Crawler {
    client: Client,
    granularity: ScopeGranularity,
    deadline: Option<Duration>,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new() -> Self {
        Self::with_timeout(5)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent("Sitescout/0.2 (https://github.com/sitescout/sitescout)")
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs((timeout_secs / 2).max(1)))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            granularity: ScopeGranularity::default(),
            deadline: None,
            progress_callback: None,
        }
    }

    pub fn with_granularity(mut self, granularity: ScopeGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Whole-run deadline. Once elapsed, workers stop pulling work and the
    /// partial result is returned.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// The shared HTTP client, for collaborators that fetch within the same
    /// run (sitemap resolution reuses the pool and timeouts).
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn crawl(&self, root: &Url, workers: usize) -> Result<Traversal> {
        info!("Starting traversal of {} with {} workers", root, workers);

        let scope = Arc::new(Scope::new(root, self.granularity));
        let mut start = root.clone();
        start.set_fragment(None);

        let visited: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));
        // Admission order doubles as the stable presentation order.
        let order: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let failures: Arc<Mutex<Vec<FetchFailure>>> = Arc::new(Mutex::new(Vec::new()));
        let frontier: Arc<Mutex<VecDeque<Url>>> = Arc::new(Mutex::new(VecDeque::new()));
        let in_flight = Arc::new(AtomicUsize::new(0));

        {
            let mut visited = visited.lock().await;
            visited.insert(start.to_string());
            order.lock().await.push(start.to_string());
            frontier.lock().await.push_back(start);
        }

        let started = Instant::now();
        let mut worker_handles = Vec::new();

        for worker_id in 0..workers.max(1) {
            let client = self.client.clone();
            let scope = scope.clone();
            let deadline = self.deadline;
            let progress_cb = self.progress_callback.clone();
            let visited = visited.clone();
            let order = order.clone();
            let failures = failures.clone();
            let frontier = frontier.clone();
            let in_flight = in_flight.clone();

            let handle = tokio::spawn(async move {
                debug!("Worker {} started", worker_id);

                loop {
                    if let Some(deadline) = deadline
                        && started.elapsed() >= deadline
                    {
                        debug!("Worker {} stopping: run deadline reached", worker_id);
                        break;
                    }

                    // Pop and mark in-flight under one lock so an idle
                    // worker never observes "empty and nothing running"
                    // while a sibling is between pop and increment.
                    let work_item = {
                        let mut queue = frontier.lock().await;
                        let item = queue.pop_front();
                        if item.is_some() {
                            in_flight.fetch_add(1, Ordering::SeqCst);
                        } else if in_flight.load(Ordering::SeqCst) == 0 {
                            debug!("Worker {} exiting: frontier drained", worker_id);
                            break;
                        }
                        item
                    };

                    let Some(url) = work_item else {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        continue;
                    };

                    if let Some(ref callback) = progress_cb {
                        callback(worker_id, url.to_string());
                    }

                    match Self::fetch_page(&client, &url).await {
                        Ok(Some(body)) => {
                            for href in Self::extract_hrefs(&body) {
                                let Some(next) = scope.resolve(&href, &url) else {
                                    continue;
                                };
                                let key = next.to_string();

                                // Atomic test-and-insert is the admission
                                // gate: exactly one worker may dispatch a
                                // given URL.
                                let admitted = {
                                    let mut visited = visited.lock().await;
                                    visited.insert(key.clone())
                                };

                                if admitted {
                                    debug!("[Worker {}] Admitted {}", worker_id, key);
                                    order.lock().await.push(key);
                                    frontier.lock().await.push_back(next);
                                }
                            }
                        }
                        Ok(None) => {
                            debug!("[Worker {}] {} is not HTML, no links", worker_id, url);
                        }
                        Err(e) => {
                            warn!("Fetch failed for {}: {}", url, e);
                            failures.lock().await.push(FetchFailure {
                                url: url.to_string(),
                                reason: e.to_string(),
                            });
                        }
                    }

                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }

                debug!("Worker {} finished", worker_id);
            });

            worker_handles.push(handle);
        }

        for joined in futures::future::join_all(worker_handles).await {
            joined?;
        }

        let urls = order.lock().await.clone();
        let failures = failures.lock().await.clone();
        info!(
            "Traversal complete. {} pages discovered, {} failures",
            urls.len(),
            failures.len()
        );

        Ok(Traversal { urls, failures })
    }

    /// Fetch one page. `Ok(None)` means the page exists but is not HTML and
    /// so contributes no outbound links. Non-2xx responses are failures.
    async fn fetch_page(client: &Client, url: &Url) -> Result<Option<String>> {
        debug!("Fetching {}", url);

        let response = client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::Other(format!("unexpected status {}", status)));
        }

        let is_html = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false);

        if !is_html {
            return Ok(None);
        }

        let body = response.text().await?;
        Ok(Some(body))
    }

    /// Raw anchor hrefs, not yet resolved or validated.
    fn extract_hrefs(html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let link_selector = Selector::parse("a[href]").unwrap();

        document
            .select(&link_selector)
            .filter_map(|element| element.value().attr("href"))
            .map(|href| href.to_string())
            .collect()
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}
