//! Human-readable output using rich_rust.
//!
//! Lays out the page top to bottom: title and caption, the selected range,
//! the account summary tiles, the per-query cost table and the warehouse
//! credit chart. A failed section is replaced in place by its warning.

use crate::core::models::{
    ATTRIBUTION_DOC_URL, DashboardPage, PAGE_CAPTION, PAGE_TITLE, SectionId, SectionWarning,
};
use crate::error::Result;
use crate::rich::components::{CostTable, CreditChart, MetricTile, TileRow, WarningPanel};
use crate::rich::{Renderable, ThemeConfig, get_theme_config, lines_to_string, segments_to_string};
use crate::util::{format_credits, format_jobs, format_storage_tb};
use rich_rust::prelude::*;
use rich_rust::Segment;

const SUMMARY_TITLE: &str = "Account Summary";

/// Render a loaded page. `no_color` selects the plain layout.
pub fn render_report(page: &DashboardPage, no_color: bool) -> Result<String> {
    if no_color {
        Ok(render_plain(page))
    } else {
        Ok(render_rich(page, &get_theme_config()))
    }
}

/// Tiles for the summary sections that loaded; failed ones become warnings.
fn summary_tiles(page: &DashboardPage) -> (TileRow, Vec<SectionWarning>) {
    let entries = [
        (
            SectionId::CreditsUsed,
            page.credits_used.value().map(|v| format_credits(*v)),
            page.credits_used.warning(),
        ),
        (
            SectionId::JobsExecuted,
            page.jobs_executed.value().map(|v| format_jobs(*v)),
            page.jobs_executed.warning(),
        ),
        (
            SectionId::BillableStorage,
            page.billable_storage_tb.value().map(|v| format_storage_tb(*v)),
            page.billable_storage_tb.warning(),
        ),
    ];

    let mut row = TileRow::new();
    let mut warnings = Vec::new();
    for (id, value, warning) in entries {
        match (value, warning) {
            (Some(value), _) => row = row.push(MetricTile::new(id.title(), value)),
            (None, Some(message)) => warnings.push(SectionWarning {
                section: id,
                message: message.to_string(),
            }),
            (None, None) => {}
        }
    }

    (row, warnings)
}

fn section_warning(id: SectionId, message: &str) -> WarningPanel {
    WarningPanel::new(vec![SectionWarning {
        section: id,
        message: message.to_string(),
    }])
}

// =============================================================================
// Rich layout
// =============================================================================

fn line_width(line: &[Segment]) -> usize {
    line.iter().map(|s| s.text.chars().count()).sum()
}

/// Wrap lines in a titled panel just wide enough for its content.
fn panel(title: &str, lines: Vec<Vec<Segment<'static>>>, theme: &ThemeConfig) -> String {
    let content = lines.iter().map(|l| line_width(l)).max().unwrap_or(0);
    let width = (content + 4).max(title.chars().count() + 6);

    let panel = Panel::new(lines)
        .title(Text::styled(title, theme.panel_title.clone()))
        .padding((0, 1))
        .border_style(theme.panel_border.clone());

    segments_to_string(&panel.render(width), false)
}

fn header(title: &str, theme: &ThemeConfig) -> String {
    let line = vec![Segment::styled(title.to_string(), theme.panel_title.clone())];
    segments_to_string(&line, false)
}

fn render_rich(page: &DashboardPage, theme: &ThemeConfig) -> String {
    let mut out = String::new();

    out.push_str(&segments_to_string(
        &[Segment::styled(PAGE_TITLE.to_string(), theme.primary.clone())],
        false,
    ));
    out.push('\n');
    out.push_str(&lines_to_string(
        &[
            vec![Segment::styled(PAGE_CAPTION.to_string(), theme.muted.clone())],
            vec![Segment::styled(
                ATTRIBUTION_DOC_URL.to_string(),
                theme.muted.clone().underline(),
            )],
            vec![
                Segment::styled("Range: ".to_string(), theme.muted.clone()),
                Segment::plain(format!("{} ({} days)", page.range, page.range.days())),
            ],
        ],
        false,
    ));
    out.push('\n');

    // Account summary
    let (tiles, tile_warnings) = summary_tiles(page);
    let mut summary = Vec::new();
    if !tiles.is_empty() {
        summary.extend(tiles.render_segments(theme));
    }
    if !tile_warnings.is_empty() {
        if !summary.is_empty() {
            summary.push(vec![]);
        }
        summary.extend(
            WarningPanel::new(tile_warnings)
                .box_style(theme.box_style)
                .render_segments(theme),
        );
    }
    out.push_str(&panel(SUMMARY_TITLE, summary, theme));
    out.push('\n');

    // Cost per query
    out.push_str(&header(SectionId::QueryCosts.title(), theme));
    out.push('\n');
    match (page.query_costs.value(), page.query_costs.warning()) {
        (Some(rows), _) => {
            let table = CostTable::new(rows).box_style(theme.box_style);
            out.push_str(&lines_to_string(&table.render_segments(theme), false));
        }
        (None, Some(message)) => {
            let warning = section_warning(SectionId::QueryCosts, message).box_style(theme.box_style);
            out.push_str(&lines_to_string(&warning.render_segments(theme), false));
        }
        (None, None) => {}
    }
    out.push('\n');

    // Credit usage by warehouse
    let title = SectionId::WarehouseCredits.title();
    match (page.warehouse_credits.value(), page.warehouse_credits.warning()) {
        (Some(rows), _) => {
            let chart = CreditChart::new(rows).box_style(theme.box_style);
            out.push_str(&panel(title, chart.render_segments(theme), theme));
        }
        (None, Some(message)) => {
            out.push_str(&header(title, theme));
            out.push('\n');
            let warning =
                section_warning(SectionId::WarehouseCredits, message).box_style(theme.box_style);
            out.push_str(&lines_to_string(&warning.render_segments(theme), false));
        }
        (None, None) => {}
    }

    out
}

// =============================================================================
// Plain layout
// =============================================================================

fn plain_header(title: &str) -> String {
    format!("{title}\n{}\n", "=".repeat(title.chars().count()))
}

fn render_plain(page: &DashboardPage) -> String {
    let mut out = String::new();

    out.push_str(&plain_header(PAGE_TITLE));
    out.push_str(PAGE_CAPTION);
    out.push('\n');
    out.push_str(ATTRIBUTION_DOC_URL);
    out.push('\n');
    out.push_str(&format!(
        "Range: {} ({} days)\n\n",
        page.range,
        page.range.days()
    ));

    out.push_str(&plain_header(SUMMARY_TITLE));
    let (tiles, tile_warnings) = summary_tiles(page);
    if !tiles.is_empty() {
        out.push_str(&tiles.render_plain());
        out.push('\n');
    }
    if !tile_warnings.is_empty() {
        out.push_str(&WarningPanel::new(tile_warnings).render_plain());
        out.push('\n');
    }
    out.push('\n');

    out.push_str(&plain_header(SectionId::QueryCosts.title()));
    if let Some(rows) = page.query_costs.value() {
        out.push_str(&CostTable::new(rows).render_plain());
    } else if let Some(message) = page.query_costs.warning() {
        out.push_str(&section_warning(SectionId::QueryCosts, message).render_plain());
    }
    out.push_str("\n\n");

    out.push_str(&plain_header(SectionId::WarehouseCredits.title()));
    if let Some(rows) = page.warehouse_credits.value() {
        out.push_str(&CreditChart::new(rows).render_plain());
    } else if let Some(message) = page.warehouse_credits.warning() {
        out.push_str(&section_warning(SectionId::WarehouseCredits, message).render_plain());
    }
    out.push('\n');

    out
}
