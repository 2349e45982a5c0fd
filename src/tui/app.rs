//! Application state and main event loop for the TUI dashboard.
//!
//! Every picker interaction re-runs the page. Loads run on a spawned task
//! and come back over a channel; an interaction made while a load is in
//! flight is queued and started as soon as that load finishes, unless it
//! asks for the range already in flight.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tokio::sync::mpsc;

use crate::core::date_range::{self, DateRange, DateRangeInput};
use crate::core::models::DashboardPage;
use crate::core::page::load_page;
use crate::core::session::WarehouseSession;
use crate::core::views::UsageViews;
use crate::error::Result;

use super::Tui;
use super::dashboard::Dashboard;
use super::event::{Event, EventHandler, KeyAction};

/// Which bound of the range the arrow keys move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    Start,
    #[default]
    End,
}

/// Application state for the TUI dashboard.
#[derive(Debug)]
pub struct App {
    input: DateRangeInput,
    today: NaiveDate,
    lookback_days: u32,
    focus: Focus,
    /// Last page loaded for the current input.
    page: Option<DashboardPage>,
    /// Why the current input cannot be loaded.
    input_error: Option<String>,
    loading: bool,
    /// Range of the load currently running.
    in_flight: Option<DateRange>,
    queued: bool,
    last_update: Option<DateTime<Utc>>,
    table_offset: usize,
    show_help: bool,
    should_quit: bool,
}

impl App {
    #[must_use]
    pub fn new(input: DateRangeInput, today: NaiveDate, lookback_days: u32) -> Self {
        Self {
            input,
            today,
            lookback_days,
            focus: Focus::default(),
            page: None,
            input_error: None,
            loading: false,
            in_flight: None,
            queued: false,
            last_update: None,
            table_offset: 0,
            show_help: false,
            should_quit: false,
        }
    }

    #[must_use]
    pub const fn input(&self) -> DateRangeInput {
        self.input
    }

    #[must_use]
    pub const fn focus(&self) -> Focus {
        self.focus
    }

    #[must_use]
    pub const fn page(&self) -> Option<&DashboardPage> {
        self.page.as_ref()
    }

    #[must_use]
    pub fn input_error(&self) -> Option<&str> {
        self.input_error.as_deref()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub const fn is_queued(&self) -> bool {
        self.queued
    }

    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Run the application event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing or event polling fails.
    pub async fn run<S>(mut self, terminal: &mut Tui, session: Arc<S>, views: UsageViews) -> Result<()>
    where
        S: WarehouseSession + 'static,
    {
        let event_handler = EventHandler::new(100);
        let (tx, mut rx) = mpsc::channel::<DashboardPage>(1);

        if let Some(range) = self.request_load() {
            spawn_load(Arc::clone(&session), views.clone(), range, tx.clone());
        }

        while !self.should_quit {
            terminal.draw(|frame| {
                frame.render_widget(Dashboard::new(&self), frame.area());
            })?;

            let next = match event_handler.next() {
                Ok(Event::Key(key)) => self.handle_action(KeyAction::from_key_event(key)),
                Ok(Event::Tick) => {
                    self.roll_today(date_range::today());
                    match rx.try_recv() {
                        Ok(page) => self.on_loaded(page),
                        Err(_) => None,
                    }
                }
                Ok(Event::Resize(_, _)) => None,
                Err(e) => {
                    tracing::warn!("Event error: {e}");
                    None
                }
            };

            if let Some(range) = next {
                spawn_load(Arc::clone(&session), views.clone(), range, tx.clone());
            }
        }

        Ok(())
    }

    /// Advance the picker's notion of today. Entered bounds stay put; the
    /// default range and the forward clamp follow the new date.
    pub fn roll_today(&mut self, today: NaiveDate) {
        if today > self.today {
            tracing::debug!(%today, "local date rolled over");
            self.today = today;
        }
    }

    /// Apply one key action. Returns a range to load now, if any.
    pub fn handle_action(&mut self, action: KeyAction) -> Option<DateRange> {
        // If help is shown, any key dismisses it
        if self.show_help && action != KeyAction::None {
            self.show_help = false;
            return None;
        }

        match action {
            KeyAction::Quit => {
                self.should_quit = true;
                None
            }
            KeyAction::Refresh => self.request_load(),
            KeyAction::PrevDay => self.shift_focused(-1),
            KeyAction::NextDay => self.shift_focused(1),
            KeyAction::PrevWeek => self.shift_focused(-7),
            KeyAction::NextWeek => self.shift_focused(7),
            KeyAction::SwitchFocus => {
                self.focus = match self.focus {
                    Focus::Start => Focus::End,
                    Focus::End => Focus::Start,
                };
                None
            }
            KeyAction::ClearBound => {
                match self.focus {
                    Focus::Start => self.input.start = None,
                    Focus::End => self.input.end = None,
                }
                self.request_load()
            }
            KeyAction::ResetRange => {
                self.input = DateRangeInput::default_for(self.today, self.lookback_days);
                self.request_load()
            }
            KeyAction::ScrollUp => {
                self.table_offset = self.table_offset.saturating_sub(1);
                None
            }
            KeyAction::ScrollDown => {
                let rows = self
                    .page
                    .as_ref()
                    .and_then(|p| p.query_costs.value())
                    .map_or(0, Vec::len);
                if self.table_offset + 1 < rows {
                    self.table_offset += 1;
                }
                None
            }
            KeyAction::Help => {
                self.show_help = true;
                None
            }
            KeyAction::None => None,
        }
    }

    /// Move the focused bound, never past today. A cleared bound restarts
    /// from its default.
    fn shift_focused(&mut self, days: i64) -> Option<DateRange> {
        let defaults = DateRangeInput::default_for(self.today, self.lookback_days);
        let (slot, fallback) = match self.focus {
            Focus::Start => (&mut self.input.start, defaults.start),
            Focus::End => (&mut self.input.end, defaults.end),
        };
        let moved = slot
            .or(fallback)
            .map(|date| (date + Duration::days(days)).min(self.today));
        if moved == *slot {
            return None;
        }
        *slot = moved;
        self.request_load()
    }

    /// Validate the picker and start a load, or queue it behind the one in
    /// flight. Invalid input clears the page and issues nothing.
    fn request_load(&mut self) -> Option<DateRange> {
        match self.input.validate(self.today) {
            Ok(range) => {
                self.input_error = None;
                if self.loading {
                    self.queued = self.in_flight != Some(range);
                    return None;
                }
                self.loading = true;
                self.in_flight = Some(range);
                Some(range)
            }
            Err(err) => {
                tracing::debug!(error = %err, "date input halted the page");
                self.input_error = Some(err.to_string());
                self.page = None;
                self.queued = false;
                None
            }
        }
    }

    /// Accept a finished load. Returns the queued range to load next, if any.
    pub fn on_loaded(&mut self, page: DashboardPage) -> Option<DateRange> {
        self.loading = false;
        self.in_flight = None;

        // Input moved on while this load ran
        let current = self.input.validate(self.today).ok();
        if current == Some(page.range) {
            self.page = Some(page);
            self.last_update = Some(Utc::now());
            self.table_offset = 0;
        }

        if std::mem::take(&mut self.queued) {
            return self.request_load();
        }
        None
    }

    pub(super) const fn table_offset(&self) -> usize {
        self.table_offset
    }

    pub(super) const fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub(super) const fn show_help(&self) -> bool {
        self.show_help
    }
}

fn spawn_load<S>(
    session: Arc<S>,
    views: UsageViews,
    range: DateRange,
    tx: mpsc::Sender<DashboardPage>,
) where
    S: WarehouseSession + 'static,
{
    tokio::spawn(async move {
        let page = load_page(session.as_ref(), &views, range).await;
        let _ = tx.send(page).await;
    });
}
