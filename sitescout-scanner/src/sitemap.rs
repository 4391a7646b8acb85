use crate::error::{Result, ScoutError};
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info};
use url::Url;

/// How a sitemap is detected from the root URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SitemapHeuristic {
    /// The root URL's path itself ends in `.xml`.
    XmlSuffix,
    /// The root page carries an anchor whose href mentions "sitemap".
    AnchorScan,
    #[default]
    Both,
}

impl SitemapHeuristic {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "xml-suffix" | "xml_suffix" => Some(SitemapHeuristic::XmlSuffix),
            "anchor-scan" | "anchor_scan" => Some(SitemapHeuristic::AnchorScan),
            "both" => Some(SitemapHeuristic::Both),
            _ => None,
        }
    }
}

/// Locate a machine-readable sitemap for the root, or report that none
/// exists. A root-page fetch failure here is recoverable ("no sitemap
/// found"): the traversal fallback will surface the broken root itself.
pub async fn find_sitemap(
    client: &Client,
    root: &Url,
    heuristic: SitemapHeuristic,
) -> Result<Option<Url>> {
    if matches!(
        heuristic,
        SitemapHeuristic::XmlSuffix | SitemapHeuristic::Both
    ) && root.path().ends_with(".xml")
    {
        debug!("Root {} is itself a sitemap", root);
        return Ok(Some(root.clone()));
    }

    if matches!(
        heuristic,
        SitemapHeuristic::AnchorScan | SitemapHeuristic::Both
    ) {
        let response = match client.get(root.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Root fetch failed during sitemap detection: {}", e);
                return Ok(None);
            }
        };
        if !response.status().is_success() {
            return Ok(None);
        }
        let Ok(body) = response.text().await else {
            return Ok(None);
        };

        if let Some(href) = scan_for_sitemap_anchor(&body)
            && let Ok(resolved) = root.join(&href)
        {
            info!("Sitemap link discovered on root page: {}", resolved);
            return Ok(Some(resolved));
        }
    }

    Ok(None)
}

/// First anchor href mentioning "sitemap", unresolved.
fn scan_for_sitemap_anchor(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("a[href]").unwrap();

    document
        .select(&link_selector)
        .filter_map(|element| element.value().attr("href"))
        .find(|href| href.to_lowercase().contains("sitemap"))
        .map(|href| href.to_string())
}

/// Expand a confirmed sitemap into a flat URL list, following
/// `<sitemapindex>` references. Fetch or parse failure on any confirmed
/// sitemap is a hard error, distinguishable from "no sitemap present".
///
/// A seen-sitemap set guarantees termination against cyclic or
/// self-referential indices.
pub async fn expand(client: &Client, sitemap_url: &Url) -> Result<Vec<String>> {
    let mut urls = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<Url> = VecDeque::new();
    queue.push_back(sitemap_url.clone());

    while let Some(current) = queue.pop_front() {
        if !seen.insert(current.to_string()) {
            debug!("Skipping already-expanded sitemap {}", current);
            continue;
        }

        let body = fetch_sitemap(client, &current).await?;
        let parsed =
            parse_sitemap_xml(&body).map_err(|e| ScoutError::SitemapUnavailable {
                url: current.to_string(),
                reason: format!("malformed XML: {}", e),
            })?;

        debug!(
            "Sitemap {} listed {} urls, {} child sitemaps",
            current,
            parsed.urls.len(),
            parsed.child_sitemaps.len()
        );
        urls.extend(parsed.urls);

        for child in parsed.child_sitemaps {
            if let Ok(child_url) = current.join(&child) {
                queue.push_back(child_url);
            }
        }
    }

    info!(
        "Sitemap expansion of {} produced {} urls",
        sitemap_url,
        urls.len()
    );
    Ok(urls)
}

async fn fetch_sitemap(client: &Client, url: &Url) -> Result<String> {
    let response =
        client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ScoutError::SitemapUnavailable {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScoutError::SitemapUnavailable {
            url: url.to_string(),
            reason: format!("unexpected status {}", status),
        });
    }

    response
        .text()
        .await
        .map_err(|e| ScoutError::SitemapUnavailable {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

#[derive(Debug, Default)]
struct ParsedSitemap {
    urls: Vec<String>,
    child_sitemaps: Vec<String>,
}

/// Read `<urlset><url><loc>` and `<sitemapindex><sitemap><loc>` text values.
/// A well-formed document of any other shape yields an empty result.
fn parse_sitemap_xml(xml: &str) -> std::result::Result<ParsedSitemap, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut parsed = ParsedSitemap::default();
    let mut stack: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                stack.push(name);
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(t) => {
                if stack.last().map(String::as_str) == Some("loc") {
                    let parent = stack.len().checked_sub(2).and_then(|i| stack.get(i));
                    let loc = t.unescape()?.trim().to_string();
                    if loc.is_empty() {
                        continue;
                    }
                    match parent.map(String::as_str) {
                        Some("url") => parsed.urls.push(loc),
                        Some("sitemap") => parsed.child_sitemaps.push(loc),
                        _ => {}
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(parsed)
}
