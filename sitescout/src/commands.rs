use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitescout")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitescout")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Discover every reachable page on a site, preferring its sitemap and \
                falling back to link traversal.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The root URL that defines the crawl scope")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of root URLs to discover")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async worker 'threads' in the worker pool.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("5"),
                )
                .arg(
                    arg!(--"deadline" <SECONDS>)
                        .required(false)
                        .help(
                            "Whole-run deadline in seconds; when it elapses the partial \
                        result gathered so far is reported",
                        )
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"scope" <MODE>)
                        .required(false)
                        .help("Scope granularity: same origin, or same path prefix as the root")
                        .value_parser(["origin", "path-prefix"])
                        .default_value("origin"),
                )
                .arg(
                    arg!(--"sitemap-detection" <HEURISTIC>)
                        .required(false)
                        .help("How to detect a sitemap before falling back to traversal")
                        .value_parser(["xml-suffix", "anchor-scan", "both"])
                        .default_value("both"),
                )
                .arg(
                    arg!(--"no-sitemap")
                        .required(false)
                        .help("Skip sitemap detection and always traverse links")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"paths")
                        .required(false)
                        .help("Render path components instead of full URLs")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"skip-root")
                        .required(false)
                        .help("Leave the root URL's own entry out of the result table")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv, markdown")
                        .value_parser(["text", "json", "csv", "markdown"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            command!("sitemap")
                .about("Resolve and expand a site's sitemap without traversing links")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The root URL (or a direct .xml sitemap URL)")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("5"),
                )
                .arg(
                    arg!(--"sitemap-detection" <HEURISTIC>)
                        .required(false)
                        .help("How to detect the sitemap from the root URL")
                        .value_parser(["xml-suffix", "anchor-scan", "both"])
                        .default_value("both"),
                ),
        )
}
