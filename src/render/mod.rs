//! Output rendering for human and robot modes.

pub mod error;
pub mod human;
pub mod robot;

use crate::cli::args::OutputFormat;
use crate::core::models::DashboardPage;
use crate::error::Result;

/// Render a loaded page in the requested format.
pub fn render_report(
    page: &DashboardPage,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => human::render_report(page, no_color),
        OutputFormat::Json => robot::render_report_json(page, pretty),
        OutputFormat::Md => robot::render_report_md(page),
    }
}
