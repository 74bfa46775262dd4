//! Output module for generating crawl reports
//!
//! This module handles:
//! - Tallying crawl statistics
//! - Rendering markdown and JSON reports of a session
//! - Writing reports to a file or stdout

mod markdown;
mod report;
pub mod stats;
mod traits;

pub use markdown::{format_markdown_report, MarkdownReport};
pub use report::{JsonReport, RobotsReport, SessionReport, SettingsReport};
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{OutputError, OutputFormat, OutputResult, ReportFormatter};

use crate::crawler::CrawlSession;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Builds the formatter for `format`
pub fn formatter(format: OutputFormat, config_hash: Option<&str>) -> Box<dyn ReportFormatter> {
    match format {
        OutputFormat::Markdown => Box::new(MarkdownReport {
            config_hash: config_hash.map(str::to_string),
        }),
        OutputFormat::Json => Box::new(JsonReport { pretty: true }),
    }
}

/// Renders a session and writes it to `output_path`, or stdout when `None`
///
/// # Arguments
///
/// * `session` - The finished crawl session
/// * `format` - Report format
/// * `output_path` - Destination file; stdout if `None`
/// * `config_hash` - Hash of the configuration file, if one was used
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to render or write the report
pub fn write_report(
    session: &CrawlSession,
    format: OutputFormat,
    output_path: Option<&Path>,
    config_hash: Option<&str>,
) -> OutputResult<()> {
    let rendered = formatter(format, config_hash).render(session)?;

    match output_path {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(rendered.as_bytes())?;
            tracing::info!("Wrote {} report to {}", format, path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(rendered.as_bytes())?;
            if !rendered.ends_with('\n') {
                handle.write_all(b"\n")?;
            }
        }
    }

    Ok(())
}
