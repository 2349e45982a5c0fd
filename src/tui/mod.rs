//! TUI dashboard module using ratatui.
//!
//! The interactive variant of the report: the date-range picker is a
//! widget and every interaction re-runs the page.

mod app;
mod dashboard;
mod event;

pub use app::{App, Focus};
pub use dashboard::Dashboard;
pub use event::{Event, EventHandler, KeyAction};

use std::io;
use std::sync::Arc;

use chrono::NaiveDate;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use crate::core::date_range::DateRangeInput;
use crate::core::session::WarehouseSession;
use crate::core::views::UsageViews;
use crate::error::Result;

/// Terminal type alias for the TUI backend.
pub type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// Initialize the terminal for TUI mode.
///
/// # Errors
///
/// Returns an error if terminal initialization fails.
pub fn init_terminal() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

/// Restore the terminal to normal mode.
///
/// # Errors
///
/// Returns an error if terminal restoration fails.
pub fn restore_terminal(terminal: &mut Tui) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the TUI dashboard until the user quits.
///
/// # Errors
///
/// Returns an error if the terminal cannot be set up or drawn.
pub async fn run_dashboard<S>(
    session: Arc<S>,
    views: UsageViews,
    input: DateRangeInput,
    today: NaiveDate,
    lookback_days: u32,
) -> Result<()>
where
    S: WarehouseSession + 'static,
{
    let mut terminal = init_terminal()?;

    let app_result = App::new(input, today, lookback_days)
        .run(&mut terminal, session, views)
        .await;

    // Always try to restore terminal, even if app failed
    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Failed to restore terminal: {e}");
    }

    app_result
}
