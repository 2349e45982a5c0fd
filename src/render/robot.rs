//! Robot-mode output (JSON and Markdown).
//!
//! JSON wraps the page in the versioned envelope; Markdown renders the same
//! sections as headings, a bullet list and pipe tables.

use std::fmt::Write;

use crate::core::models::{
    ATTRIBUTION_DOC_URL, DashboardPage, PAGE_TITLE, RobotOutput, SectionId,
};
use crate::error::Result;
use crate::rich::components::{COST_TABLE_COLUMNS, format_credit_cell, row_cells};
use crate::util::{format_credits, format_jobs, format_storage_tb};

/// Render any serializable output as JSON.
pub fn render_json<T: serde::Serialize>(output: &T) -> Result<String> {
    Ok(serde_json::to_string(output)?)
}

/// Render any serializable output as pretty JSON.
pub fn render_json_pretty<T: serde::Serialize>(output: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(output)?)
}

/// Render the page inside the `sfcost.v1` envelope.
pub fn render_report_json(page: &DashboardPage, pretty: bool) -> Result<String> {
    let output = RobotOutput::report(page.clone());

    if pretty {
        render_json_pretty(&output)
    } else {
        render_json(&output)
    }
}

/// Pipe characters would split a cell; newlines would end the row.
fn md_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn md_warning(out: &mut String, id: SectionId, message: &str) {
    let _ = writeln!(out, "> **Warning ({})**: {}", id.title(), md_cell(message));
}

/// Render the page as Markdown.
pub fn render_report_md(page: &DashboardPage) -> Result<String> {
    let mut out = String::new();

    let _ = writeln!(out, "# {PAGE_TITLE}\n");
    let _ = writeln!(
        out,
        "Credit usage per query, based on the [query_attribution_history]({ATTRIBUTION_DOC_URL}) view.\n"
    );
    let _ = writeln!(out, "- range: {} to {}", page.range.start(), page.range.end());
    let _ = writeln!(out, "- days: {}\n", page.range.days());

    out.push_str("## Account Summary\n\n");
    let tiles = [
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
    for (id, value, warning) in &tiles {
        if let Some(value) = value {
            let _ = writeln!(out, "- {}: {value}", id.title());
        }
        if let Some(message) = warning {
            md_warning(&mut out, *id, message);
        }
    }
    out.push('\n');

    let _ = writeln!(out, "## {}\n", SectionId::QueryCosts.title());
    if let Some(rows) = page.query_costs.value() {
        if rows.is_empty() {
            out.push_str("_No queries in range._\n");
        } else {
            let _ = writeln!(out, "| {} |", COST_TABLE_COLUMNS.join(" | "));
            let _ = writeln!(
                out,
                "|{}|",
                COST_TABLE_COLUMNS.map(|_| "---").join("|")
            );
            for row in rows {
                let cells = row_cells(row).map(|c| md_cell(&c));
                let _ = writeln!(out, "| {} |", cells.join(" | "));
            }
        }
    } else if let Some(message) = page.query_costs.warning() {
        md_warning(&mut out, SectionId::QueryCosts, message);
    }
    out.push('\n');

    let _ = writeln!(out, "## {}\n", SectionId::WarehouseCredits.title());
    if let Some(rows) = page.warehouse_credits.value() {
        if rows.is_empty() {
            out.push_str("_No warehouse usage in range._\n");
        } else {
            out.push_str("| WAREHOUSE_NAME | TOTAL_CREDITS_USED |\n");
            out.push_str("|---|---|\n");
            for row in rows {
                let _ = writeln!(
                    out,
                    "| {} | {} |",
                    md_cell(&row.warehouse_name),
                    format_credit_cell(row.total_credits_used)
                );
            }
        }
    } else if let Some(message) = page.warehouse_credits.warning() {
        md_warning(&mut out, SectionId::WarehouseCredits, message);
    }

    Ok(out)
}
