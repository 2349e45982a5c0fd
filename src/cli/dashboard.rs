//! The `dashboard` command: the page behind an interactive date picker.

use std::sync::Arc;

use crate::cli::args::{Cli, DashboardArgs};
use crate::core::date_range;
use crate::core::session::SqlApiSession;
use crate::error::Result;
use crate::storage::config::ResolvedConfig;
use crate::tui;

/// Execute the dashboard command.
///
/// The initial range may be invalid; the dashboard opens anyway and shows
/// the date error until the picker is fixed.
///
/// # Errors
///
/// Returns an error for unparseable dates, configuration problems, or a
/// terminal failure.
pub async fn execute(cli: &Cli, args: &DashboardArgs) -> Result<()> {
    let config = ResolvedConfig::resolve(cli)?;
    let today = date_range::today();
    let input = args.date_input(today, config.lookback_days)?;

    let token = config.resolve_token()?;
    let session = Arc::new(SqlApiSession::new(config.session_settings(token)?)?);

    tracing::debug!(account = %session.settings().account_url, "starting dashboard");
    tui::run_dashboard(session, config.views(), input, today, config.lookback_days).await
}
