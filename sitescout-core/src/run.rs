use indicatif::{ProgressBar, ProgressStyle};
use sitescout_scanner::{Discoverer, Discovery, ScopeGranularity, SitemapHeuristic};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// Options for one discovery invocation.
pub struct RunOptions {
    pub roots: Vec<String>,
    pub threads: usize,
    pub timeout_secs: u64,
    pub deadline_secs: Option<u64>,
    pub granularity: ScopeGranularity,
    pub heuristic: SitemapHeuristic,
    pub use_sitemap: bool,
    pub show_progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            threads: 10,
            timeout_secs: 5,
            deadline_secs: None,
            granularity: ScopeGranularity::default(),
            heuristic: SitemapHeuristic::default(),
            use_sitemap: true,
            show_progress: false,
        }
    }
}

/// Callback for reporting run-level progress messages.
pub type RunProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Extract the path component from a URL.
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Run discovery over every configured root and collect the results.
///
/// With a single root, its failure is the run's failure. With several, a
/// failed root is reported through the callback and the rest continue.
pub async fn execute_discovery(
    options: RunOptions,
    progress_callback: Option<RunProgressCallback>,
) -> Result<Vec<Discovery>, String> {
    let RunOptions {
        roots,
        threads,
        timeout_secs,
        deadline_secs,
        granularity,
        heuristic,
        use_sitemap,
        show_progress,
    } = options;

    let progress_bar = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.set_message("Starting discovery...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));

    let internal_progress_callback: sitescout_scanner::ProgressCallback = if show_progress {
        let pb_clone = progress_bar.clone().unwrap();
        let count_clone = processed_count.clone();
        Arc::new(move |_worker_id: usize, _url: String| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            pb_clone.set_message(format!("Discovering... {} URLs fetched", count));
            pb_clone.tick();
        })
    } else {
        Arc::new(|_worker_id: usize, _url: String| {})
    };

    let mut discoverer = Discoverer::with_timeout(timeout_secs)
        .with_workers(threads)
        .with_granularity(granularity)
        .with_heuristic(heuristic)
        .with_progress_callback(internal_progress_callback);
    if !use_sitemap {
        discoverer = discoverer.with_sitemap_disabled();
    }
    if let Some(deadline_secs) = deadline_secs {
        discoverer = discoverer.with_deadline(std::time::Duration::from_secs(deadline_secs));
    }

    let single_root = roots.len() == 1;
    let mut discoveries = Vec::new();

    for (idx, root) in roots.iter().enumerate() {
        if let Some(ref callback) = progress_callback
            && roots.len() > 1
        {
            callback(format!(
                "Discovering host {}/{}: {}",
                idx + 1,
                roots.len(),
                root
            ));
        }

        match discoverer.run(root).await {
            Ok(discovery) => discoveries.push(discovery),
            Err(e) if single_root => {
                if let Some(ref pb) = progress_bar {
                    pb.finish_and_clear();
                }
                return Err(e.to_string());
            }
            Err(e) => {
                if let Some(ref callback) = progress_callback {
                    callback(format!("[!]  Failed to discover {}: {}", root, e));
                }
            }
        }
    }

    if let Some(ref pb) = progress_bar {
        let total: usize = discoveries.iter().map(|d| d.urls.len()).sum();
        pb.finish_with_message(format!("Discovery complete! {} unique locations", total));
    }

    Ok(discoveries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_paths() {
        assert_eq!(extract_url_path("https://example.com/api/users"), "/api/users");
        assert_eq!(extract_url_path("https://example.com/"), "/");
        assert_eq!(extract_url_path("https://example.com"), "/");
        assert_eq!(extract_url_path("not a url"), "not a url");
    }

    #[tokio::test]
    async fn single_root_failure_fails_the_run() {
        let options = RunOptions {
            roots: vec!["not a url".to_string()],
            ..RunOptions::default()
        };
        let result = execute_discovery(options, None).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid URL"));
    }
}
