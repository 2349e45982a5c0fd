//! The `report` command: one page load rendered to stdout.

use chrono::NaiveDate;

use crate::cli::args::{Cli, ReportArgs};
use crate::core::date_range::{self, DateRangeInput};
use crate::core::page::load_page;
use crate::core::session::{SqlApiSession, WarehouseSession};
use crate::error::Result;
use crate::render;
use crate::rich::should_use_rich_output;
use crate::storage::config::ResolvedConfig;

/// Execute the report command.
///
/// Date input is validated before the session is built, so a bad range
/// fails without touching the network or the credential store.
///
/// # Errors
///
/// Returns an error for invalid date input, configuration problems, or a
/// rendering failure. Section failures are not errors: they render as
/// warnings and the command still succeeds.
pub async fn execute(cli: &Cli, args: &ReportArgs) -> Result<()> {
    let config = ResolvedConfig::resolve(cli)?;
    let today = date_range::today();
    let input = args.date_input(today, config.lookback_days)?;
    input.validate(today)?;

    let token = config.resolve_token()?;
    let session = SqlApiSession::new(config.session_settings(token)?)?;

    let output = run_report(&session, &config, input, today).await?;
    println!("{output}");
    Ok(())
}

/// Load and render one page against any session.
///
/// # Errors
///
/// Returns the date-range error (with no statement issued) or a rendering
/// error.
pub async fn run_report<S: WarehouseSession>(
    session: &S,
    config: &ResolvedConfig,
    input: DateRangeInput,
    today: NaiveDate,
) -> Result<String> {
    let range = input.validate(today)?;
    let page = load_page(session, &config.views(), range).await;

    let warnings = page.warnings();
    if !warnings.is_empty() {
        tracing::info!(failed = warnings.len(), "page rendered with warnings");
    }

    let plain = !should_use_rich_output(config.format, config.no_color);
    render::render_report(&page, config.format, config.pretty, plain)
}
