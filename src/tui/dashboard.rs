//! Dashboard widget for the TUI.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Row, Table, Widget, Wrap},
};

use crate::core::models::{
    DashboardPage, PAGE_CAPTION, PAGE_TITLE, QueryCostRow, Section, SectionId, WarehouseCredits,
};
use crate::rich::components::{COST_TABLE_COLUMNS, format_credit_cell, row_cells, truncate};
use crate::util::{format_credits, format_jobs, format_relative_time, format_storage_tb};

use super::app::{App, Focus};

/// Bar values are integers; credits keep four decimals of resolution.
const BAR_SCALE: f64 = 10_000.0;

const QUERY_PANEL_HEIGHT: u16 = 6;

/// The main dashboard layout.
pub struct Dashboard<'a> {
    app: &'a App,
}

impl<'a> Dashboard<'a> {
    #[must_use]
    pub const fn new(app: &'a App) -> Self {
        Self { app }
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let title = Line::from(vec![
            Span::styled(
                format!(" {PAGE_TITLE} "),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled("[?] Help  ", Style::default().fg(Color::DarkGray)),
            Span::styled("[r] Refresh  ", Style::default().fg(Color::DarkGray)),
            Span::styled("[q] Quit", Style::default().fg(Color::DarkGray)),
        ]);

        Paragraph::new(title)
            .style(Style::default().bg(Color::Black))
            .render(area, buf);
    }

    fn render_picker(&self, area: Rect, buf: &mut Buffer) {
        let input = self.app.input();
        let bound = |label: &'static str, date: Option<chrono::NaiveDate>, focused: bool| {
            let value = date.map_or_else(|| "----------".to_string(), |d| d.to_string());
            let style = if focused {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            vec![
                Span::styled(label, Style::default().fg(Color::DarkGray)),
                Span::styled(format!(" {value} "), style),
            ]
        };

        let mut spans = bound("Start", input.start, self.app.focus() == Focus::Start);
        spans.push(Span::raw("   "));
        spans.extend(bound("End", input.end, self.app.focus() == Focus::End));
        spans.push(Span::raw("   "));
        if let Some(error) = self.app.input_error() {
            spans.push(Span::styled(
                error.to_string(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
        } else if self.app.is_loading() {
            spans.push(Span::styled("Loading...", Style::default().fg(Color::Yellow)));
        } else if let Some(page) = self.app.page() {
            spans.push(Span::styled(
                format!("{} days", page.range.days()),
                Style::default().fg(Color::DarkGray),
            ));
        }

        let lines = vec![
            Line::from(Span::styled(PAGE_CAPTION, Style::default().fg(Color::DarkGray))),
            Line::from(spans),
        ];

        let block = Block::default()
            .title(" Date range ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        Paragraph::new(lines).block(block).render(area, buf);
    }

    fn render_tiles(page: &DashboardPage, area: Rect, buf: &mut Buffer) {
        let tiles = [
            tile(SectionId::CreditsUsed, &page.credits_used, |v| format_credits(*v)),
            tile(SectionId::JobsExecuted, &page.jobs_executed, |v| format_jobs(*v)),
            tile(SectionId::BillableStorage, &page.billable_storage_tb, |v| {
                format_storage_tb(*v)
            }),
        ];

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(area);

        for (paragraph, chunk) in tiles.into_iter().zip(chunks.iter()) {
            paragraph.render(*chunk, buf);
        }
    }

    fn render_table(&self, page: &DashboardPage, area: Rect, buf: &mut Buffer) {
        let title = format!(" {} ", SectionId::QueryCosts.title());
        let rows = match &page.query_costs {
            Section::Ready { value } => value,
            Section::Failed { message } => {
                warning(&title, message).render(area, buf);
                return;
            }
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(4), Constraint::Length(QUERY_PANEL_HEIGHT)])
            .split(area);

        let header = Row::new(COST_TABLE_COLUMNS.to_vec())
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        let body: Vec<Row> = rows
            .iter()
            .skip(self.app.table_offset())
            .enumerate()
            .map(|(idx, row)| {
                let row_widget = table_row(row);
                if idx == 0 {
                    row_widget.style(Style::default().add_modifier(Modifier::REVERSED))
                } else {
                    row_widget
                }
            })
            .collect();

        let widths = [
            Constraint::Length(20),
            Constraint::Length(12),
            Constraint::Length(19),
            Constraint::Length(19),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Min(20),
        ];

        let block = Block::default()
            .title(format!(
                "{title}({} of {}) ",
                (self.app.table_offset() + 1).min(rows.len()),
                rows.len()
            ))
            .borders(Borders::ALL);

        Table::new(body, widths)
            .header(header)
            .block(block)
            .render(chunks[0], buf);

        query_panel(rows.get(self.app.table_offset())).render(chunks[1], buf);
    }

    fn render_chart(page: &DashboardPage, area: Rect, buf: &mut Buffer) {
        let title = format!(" {} ", SectionId::WarehouseCredits.title());
        let rows = match &page.warehouse_credits {
            Section::Ready { value } => value,
            Section::Failed { message } => {
                warning(&title, message).render(area, buf);
                return;
            }
        };

        let block = Block::default().title(title).borders(Borders::ALL);
        if rows.is_empty() {
            Paragraph::new("No warehouse usage in range")
                .block(block)
                .render(area, buf);
            return;
        }

        let bars: Vec<Bar> = rows.iter().map(chart_bar).collect();
        BarChart::default()
            .block(block)
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .bar_style(Style::default().fg(Color::Cyan))
            .data(BarGroup::default().bars(&bars))
            .render(area, buf);
    }

    fn render_footer(&self, area: Rect, buf: &mut Buffer) {
        let update_text = self.app.last_update().map_or_else(
            || "No page loaded yet".to_string(),
            |ts| format!("Last updated: {}", format_relative_time(ts)),
        );

        let footer = Line::from(vec![
            Span::raw(" "),
            Span::styled(update_text, Style::default().fg(Color::DarkGray)),
            Span::raw("    "),
            Span::styled(
                "Tab focus  ←/→ day  ↑/↓ week  ⌫ clear  t reset",
                Style::default().fg(Color::DarkGray),
            ),
        ]);

        Paragraph::new(footer).render(area, buf);
    }

    fn render_help(area: Rect, buf: &mut Buffer) {
        let help_text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "  sfcost dashboard - Keyboard Shortcuts",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("  Date range:"),
            Line::from("    Tab           Switch between start and end"),
            Line::from("    ←/h, →/l      Move focused date by a day"),
            Line::from("    ↓, ↑          Move focused date by a week"),
            Line::from("    Backspace     Clear focused date"),
            Line::from("    t             Reset to the default range"),
            Line::from(""),
            Line::from("  Actions:"),
            Line::from("    j/k, PgDn/PgUp  Scroll the cost table"),
            Line::from("    r, F5         Reload the page"),
            Line::from("    ?, F1         Show this help"),
            Line::from("    q, Esc        Quit"),
            Line::from(""),
            Line::from(Span::styled(
                "  Press any key to close",
                Style::default().fg(Color::DarkGray),
            )),
        ];

        let help_width = 52;
        let help_height = 20;
        let x = area.x + (area.width.saturating_sub(help_width)) / 2;
        let y = area.y + (area.height.saturating_sub(help_height)) / 2;
        let help_area = Rect::new(x, y, help_width.min(area.width), help_height.min(area.height));

        let block = Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .style(Style::default().bg(Color::Black));

        Clear.render(help_area, buf);
        Paragraph::new(help_text).block(block).render(help_area, buf);
    }
}

fn tile<T>(id: SectionId, section: &Section<T>, format: impl Fn(&T) -> String) -> Paragraph<'static> {
    let title = format!(" {} ", id.title());
    match section {
        Section::Ready { value } => {
            let block = Block::default().title(title).borders(Borders::ALL);
            Paragraph::new(Line::from(Span::styled(
                format(value),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )))
            .block(block)
        }
        Section::Failed { message } => warning(&title, message),
    }
}

fn warning(title: &str, message: &str) -> Paragraph<'static> {
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    Paragraph::new(Line::from(vec![
        Span::styled("⚠ ", Style::default().fg(Color::Yellow)),
        Span::styled(message.to_string(), Style::default().fg(Color::Yellow)),
    ]))
    .wrap(Wrap { trim: true })
    .block(block)
}

/// Full text of the top visible query, wrapped rather than cut.
fn query_panel(row: Option<&QueryCostRow>) -> Paragraph<'static> {
    let (title, text) = match row {
        Some(row) => (
            format!(" QUERY_TEXT {} ", row.query_id),
            row.query_text.clone().unwrap_or_else(|| "-".to_string()),
        ),
        None => (" QUERY_TEXT ".to_string(), String::new()),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    Paragraph::new(text).wrap(Wrap { trim: false }).block(block)
}

fn table_row(row: &QueryCostRow) -> Row<'static> {
    let mut cells = row_cells(row);
    let last = cells.len() - 1;
    cells[last] = truncate(&cells[last], 80, "...");
    Row::new(cells.to_vec())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bar_value(credits: Option<f64>) -> u64 {
    credits
        .filter(|v| v.is_finite() && *v > 0.0)
        .map_or(0, |v| (v * BAR_SCALE).round() as u64)
}

fn chart_bar(row: &WarehouseCredits) -> Bar<'static> {
    Bar::default()
        .label(Line::from(row.warehouse_name.clone()))
        .value(bar_value(row.total_credits_used))
        .text_value(format_credit_cell(row.total_credits_used))
}

impl Widget for Dashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Length(4), // Picker
                Constraint::Min(10),   // Page
                Constraint::Length(1), // Footer
            ])
            .split(area);

        self.render_header(chunks[0], buf);
        self.render_picker(chunks[1], buf);

        if let Some(page) = self.app.page() {
            let chart_height = page
                .warehouse_credits
                .value()
                .map_or(4, |rows| u16::try_from(rows.len()).unwrap_or(u16::MAX).saturating_add(2))
                .clamp(4, 12);

            let body = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(4),            // Tiles
                    Constraint::Min(12),              // Cost table
                    Constraint::Length(chart_height), // Chart
                ])
                .split(chunks[2]);

            Self::render_tiles(page, body[0], buf);
            self.render_table(page, body[1], buf);
            Self::render_chart(page, body[2], buf);
        } else if self.app.input_error().is_none() {
            Paragraph::new(Line::from(Span::styled(
                "Loading page...",
                Style::default().fg(Color::DarkGray),
            )))
            .render(chunks[2], buf);
        }

        self.render_footer(chunks[3], buf);

        if self.app.show_help() {
            Self::render_help(area, buf);
        }
    }
}
