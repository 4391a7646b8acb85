pub mod report;
pub mod run;

pub use report::{ReportFormat, ReportOptions, generate_report, locations, write_report};
pub use run::{RunOptions, RunProgressCallback, execute_discovery, extract_url_path};

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
     _ _
 ___(_) |_ ___  ___  ___ ___  _   _| |_
/ __| | __/ _ \/ __|/ __/ _ \| | | | __|
\__ \ | ||  __/\__ \ (_| (_) | |_| | |_
|___/_|\__\___||___/\___\___/ \__,_|\__|
"#;
    println!("{}", banner.bright_cyan());
    println!(
        "{}  {}\n",
        "sitescout".bright_white().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}
