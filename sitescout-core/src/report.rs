// Report generation from discovery results

use crate::run::extract_url_path;
use chrono::Local;
use serde::{Deserialize, Serialize};
use sitescout_scanner::{Discovery, Strategy};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

/// Presentation choices. They never change the underlying discovery data,
/// only how locations are rendered.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Render path components instead of full URLs.
    pub paths_only: bool,
    /// Leave the root's own entry out of the table.
    pub skip_root: bool,
}

/// The rendered location strings for one discovery, in stable discovery
/// order, with presentation options applied.
pub fn locations(discovery: &Discovery, options: &ReportOptions) -> Vec<String> {
    discovery
        .urls
        .iter()
        .filter(|url| !(options.skip_root && url.as_str() == discovery.root))
        .map(|url| {
            if options.paths_only {
                extract_url_path(url)
            } else {
                url.clone()
            }
        })
        .collect()
}

fn strategy_label(discovery: &Discovery) -> String {
    match discovery.strategy {
        Strategy::Sitemap => match &discovery.sitemap {
            Some(sitemap) => format!("sitemap ({})", sitemap),
            None => "sitemap".to_string(),
        },
        Strategy::Traversal => "traversal".to_string(),
    }
}

pub fn generate_report(
    discoveries: &[Discovery],
    format: &ReportFormat,
    options: &ReportOptions,
) -> String {
    match format {
        ReportFormat::Text => generate_text_report(discoveries, options),
        ReportFormat::Json => generate_json_report(discoveries, options),
        ReportFormat::Csv => generate_csv_report(discoveries, options),
        ReportFormat::Markdown => generate_markdown_report(discoveries, options),
    }
}

fn generate_text_report(discoveries: &[Discovery], options: &ReportOptions) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Sitescout report\n");
    report.push_str(&format!(
        "  Generated: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));

    let total: usize = discoveries.iter().map(|d| d.urls.len()).sum();
    report.push_str(&format!("  Hosts: {}\n", discoveries.len()));
    report.push_str(&format!("  Locations: {}\n", total));

    for discovery in discoveries {
        report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
        report.push_str(&format!("## {}\n", discovery.root));
        report.push_str(&format!("  Strategy: {}\n", strategy_label(discovery)));
        report.push_str(&format!(
            "  Duration: {:.1}s\n\n",
            discovery.duration.as_secs_f64()
        ));

        let entries = locations(discovery, options);
        if entries.is_empty() {
            report.push_str("  (no locations discovered)\n");
        } else {
            let width = entries.len().to_string().len();
            for (index, location) in entries.iter().enumerate() {
                report.push_str(&format!("  {:>width$}  {}\n", index + 1, location));
            }
        }

        if !discovery.failures.is_empty() {
            report.push_str(&format!("\n  Failures ({}):\n", discovery.failures.len()));
            for failure in &discovery.failures {
                report.push_str(&format!("    ✗ {}: {}\n", failure.url, failure.reason));
            }
        }
    }

    report.push('\n');
    report
}

#[derive(Debug, Serialize)]
struct JsonEntry {
    index: usize,
    location: String,
}

#[derive(Debug, Serialize)]
struct JsonHostReport<'a> {
    root: &'a str,
    strategy: &'a Strategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    sitemap: Option<&'a str>,
    locations: Vec<JsonEntry>,
    failures: &'a [sitescout_scanner::FetchFailure],
    duration_ms: u128,
}

fn generate_json_report(discoveries: &[Discovery], options: &ReportOptions) -> String {
    let reports: Vec<JsonHostReport> = discoveries
        .iter()
        .map(|discovery| JsonHostReport {
            root: &discovery.root,
            strategy: &discovery.strategy,
            sitemap: discovery.sitemap.as_deref(),
            locations: locations(discovery, options)
                .into_iter()
                .enumerate()
                .map(|(i, location)| JsonEntry {
                    index: i + 1,
                    location,
                })
                .collect(),
            failures: &discovery.failures,
            duration_ms: discovery.duration.as_millis(),
        })
        .collect();

    serde_json::to_string_pretty(&reports).unwrap_or_else(|_| "[]".to_string())
}

fn generate_csv_report(discoveries: &[Discovery], options: &ReportOptions) -> String {
    let mut report = String::from("root,index,location\n");
    for discovery in discoveries {
        for (index, location) in locations(discovery, options).iter().enumerate() {
            report.push_str(&format!(
                "{},{},{}\n",
                discovery.root,
                index + 1,
                location
            ));
        }
    }
    report
}

fn generate_markdown_report(discoveries: &[Discovery], options: &ReportOptions) -> String {
    let mut report = String::from("# Sitescout report\n");
    for discovery in discoveries {
        report.push_str(&format!("\n## {}\n\n", discovery.root));
        report.push_str(&format!("Strategy: {}\n\n", strategy_label(discovery)));
        report.push_str("| # | Location |\n|---|----------|\n");
        for (index, location) in locations(discovery, options).iter().enumerate() {
            report.push_str(&format!("| {} | {} |\n", index + 1, location));
        }

        if !discovery.failures.is_empty() {
            report.push_str("\n### Failures\n\n");
            for failure in &discovery.failures {
                report.push_str(&format!("- `{}`: {}\n", failure.url, failure.reason));
            }
        }
    }
    report
}

/// Write the report to a file, or to stdout when no path is given.
pub fn write_report(report: &str, output: Option<&Path>) -> std::io::Result<()> {
    match output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(report.as_bytes())
        }
        None => {
            print!("{}", report);
            Ok(())
        }
    }
}
