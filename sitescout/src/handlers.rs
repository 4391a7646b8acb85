use clap::ArgMatches;
use colored::Colorize;
use sitescout_core::report::{ReportFormat, ReportOptions};
use sitescout_core::{RunOptions, RunProgressCallback, execute_discovery};
use sitescout_scanner::{Crawler, ScopeGranularity, SitemapHeuristic, discover, sitemap};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

// Helper functions for the crawl handler

/// Load root URLs from either a file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&Url>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        Err("Either --url or --hosts-file must be provided".to_string())
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| parse_url_line(line.trim()))
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if discover::parse_root(line).is_ok() {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if discover::parse_root(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("{}  Skipping invalid URL '{}'", "⚠".yellow(), line);
    None
}

// Re-export run helpers from sitescout-core
pub use sitescout_core::{extract_url_path, generate_report, write_report};

pub async fn handle_crawl(sub_matches: &ArgMatches) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let url = sub_matches.get_one::<Url>("url");
    let hosts_file = sub_matches.get_one::<PathBuf>("hosts-file");
    let threads = *sub_matches.get_one::<usize>("threads").unwrap_or(&10);
    let timeout_secs = *sub_matches.get_one::<u64>("timeout").unwrap_or(&5);
    let deadline_secs = sub_matches.get_one::<u64>("deadline").copied();
    let no_sitemap = sub_matches.get_flag("no-sitemap");
    let paths_only = sub_matches.get_flag("paths");
    let skip_root = sub_matches.get_flag("skip-root");
    let output = sub_matches.get_one::<PathBuf>("output");

    let granularity = sub_matches
        .get_one::<String>("scope")
        .and_then(|s| ScopeGranularity::from_str(s))
        .unwrap_or_default();
    let heuristic = sub_matches
        .get_one::<String>("sitemap-detection")
        .and_then(|s| SitemapHeuristic::from_str(s))
        .unwrap_or_default();
    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|s| ReportFormat::from_str(s))
        .unwrap_or(ReportFormat::Text);

    // Load root URLs from source
    let roots = match load_urls_from_source(url, hosts_file) {
        Ok(roots) => roots,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    // Print discovery configuration
    println!("\n🕷️  Discovering {} host(s)", roots.len());
    println!("Workers: {}", threads);
    println!("Timeout: {}s", timeout_secs);
    if let Some(deadline_secs) = deadline_secs {
        println!("Deadline: {}s", deadline_secs);
    }
    let scope_str = match granularity {
        ScopeGranularity::Origin => "origin (scheme + host + port)",
        ScopeGranularity::PathPrefix => "path prefix of the root",
    };
    println!("Scope: {}", scope_str);
    let strategy_str = if no_sitemap {
        "traversal only".to_string()
    } else {
        format!("sitemap first ({:?} detection), traversal fallback", heuristic)
    };
    println!("Strategy: {}\n", strategy_str);

    let options = RunOptions {
        roots,
        threads,
        timeout_secs,
        deadline_secs,
        granularity,
        heuristic,
        use_sitemap: !no_sitemap,
        show_progress: true, // Enable the spinner in CLI mode
    };

    let progress_callback: RunProgressCallback = Arc::new(|msg: String| {
        println!("{}", msg);
    });

    let discoveries = match execute_discovery(options, Some(progress_callback)).await {
        Ok(discoveries) => discoveries,
        Err(e) => {
            eprintln!("{} Discovery failed: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    println!("\n{} Discovery complete!\n", "✓".green().bold());

    let report_options = ReportOptions {
        paths_only,
        skip_root,
    };
    let report = generate_report(&discoveries, &format, &report_options);

    if let Err(e) = write_report(&report, output.map(PathBuf::as_path)) {
        eprintln!("{} Failed to write report: {}", "✗".red().bold(), e);
        std::process::exit(1);
    }
    if let Some(path) = output {
        println!(
            "{} Report saved to {}",
            "✓".green().bold(),
            path.display().to_string().bright_white()
        );
    }
}

pub async fn handle_sitemap(sub_matches: &ArgMatches) {
    tracing_subscriber::fmt::init();

    let url = sub_matches.get_one::<Url>("url").unwrap();
    let timeout_secs = *sub_matches.get_one::<u64>("timeout").unwrap_or(&5);
    let heuristic = sub_matches
        .get_one::<String>("sitemap-detection")
        .and_then(|s| SitemapHeuristic::from_str(s))
        .unwrap_or_default();

    // Borrow the crawler's configured client so sitemap fetches get the
    // same timeouts and pooling as a full run.
    let crawler = Crawler::with_timeout(timeout_secs);
    let client = crawler.client();

    let sitemap_url = match sitemap::find_sitemap(client, url, heuristic).await {
        Ok(Some(sitemap_url)) => sitemap_url,
        Ok(None) => {
            eprintln!("{} No sitemap found for {}", "✗".red().bold(), url);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{} Sitemap lookup failed: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    match sitemap::expand(client, &sitemap_url).await {
        Ok(urls) => {
            let urls = discover::dedup(urls);
            eprintln!(
                "{} {} listed {} unique locations",
                "✓".green().bold(),
                sitemap_url,
                urls.len()
            );
            for url in &urls {
                println!("{}", url);
            }
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}
