//! Per-query cost table component.

use crate::core::models::QueryCostRow;
use crate::rich::{BoxStyle, Renderable, ThemeConfig, create_default_theme, lines_to_string};
use rich_rust::prelude::*;

use super::formatters::{
    format_count_cell, format_credit_cell, format_timestamp_cell, pad_left, pad_right, text_cell,
    truncate,
};

/// Column headers, in display order; matches the result column names.
pub const COLUMNS: [&str; 12] = [
    "QUERY_ID",
    "CREDITS_ATTRIBUTED_COMPUTE",
    "START_TIME",
    "END_TIME",
    "QUERY_TYPE",
    "SCHEMA",
    "ROLE_USER",
    "EXECUTION_STATUS",
    "TOTAL_ELAPSED_TIME",
    "ROWS_PRODUCED",
    "WAREHOUSE_NAME",
    "QUERY_TEXT",
];

/// Numeric columns are right-aligned.
const NUMERIC: [bool; 12] = [
    false, true, false, false, false, false, false, false, false, true, false, false,
];

const QUERY_TEXT_COLUMN: usize = 11;

/// Table of attributed credits, one line per query.
#[derive(Debug, Clone)]
pub struct CostTable {
    cells: Vec<[String; 12]>,
    max_text_width: Option<usize>,
    box_style: BoxStyle,
}

impl CostTable {
    /// Build from rows already in display order.
    #[must_use]
    pub fn new(rows: &[QueryCostRow]) -> Self {
        Self {
            cells: rows.iter().map(row_cells).collect(),
            max_text_width: None,
            box_style: BoxStyle::default(),
        }
    }

    /// Cap for the query text column. Uncapped by default.
    #[must_use]
    pub fn max_text_width(mut self, width: usize) -> Self {
        self.max_text_width = Some(width.max(8));
        self
    }

    #[must_use]
    pub const fn box_style(mut self, style: BoxStyle) -> Self {
        self.box_style = style;
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn ellipsis(&self) -> &'static str {
        match self.box_style {
            BoxStyle::Rounded => "…",
            BoxStyle::Ascii => "...",
        }
    }

    fn display_cells(&self) -> Vec<[String; 12]> {
        let Some(max_width) = self.max_text_width else {
            return self.cells.clone();
        };
        let ellipsis = self.ellipsis();
        self.cells
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row[QUERY_TEXT_COLUMN] =
                    truncate(&row[QUERY_TEXT_COLUMN], max_width, ellipsis);
                row
            })
            .collect()
    }

    fn column_widths(rows: &[[String; 12]]) -> [usize; 12] {
        let mut widths = COLUMNS.map(str::len);
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths
    }

    fn align(idx: usize, text: &str, width: usize) -> String {
        if NUMERIC[idx] {
            pad_left(text, width)
        } else {
            pad_right(text, width)
        }
    }

    /// Render header, rule and body as styled lines.
    #[must_use]
    pub fn render_segments(&self, theme: &ThemeConfig) -> Vec<Vec<Segment<'static>>> {
        if self.cells.is_empty() {
            return vec![vec![Segment::styled(
                "No queries in range".to_string(),
                theme.muted.clone(),
            )]];
        }

        let rows = self.display_cells();
        let widths = Self::column_widths(&rows);
        let glyphs = self.box_style.glyphs();
        let sep = format!(" {} ", glyphs.vertical);

        let mut lines = Vec::with_capacity(rows.len() + 2);

        let mut header = Vec::new();
        for (idx, (name, width)) in COLUMNS.iter().zip(widths).enumerate() {
            if idx > 0 {
                header.push(Segment::styled(sep.clone(), theme.muted.clone()));
            }
            header.push(Segment::styled(
                Self::align(idx, name, width),
                theme.table_header.clone(),
            ));
        }
        lines.push(header);

        let total: usize = widths.iter().sum::<usize>() + sep.chars().count() * (widths.len() - 1);
        lines.push(vec![Segment::styled(
            glyphs.horizontal.to_string().repeat(total),
            theme.muted.clone(),
        )]);

        for row in &rows {
            let mut line = Vec::new();
            for (idx, (cell, width)) in row.iter().zip(widths).enumerate() {
                if idx > 0 {
                    line.push(Segment::styled(sep.clone(), theme.muted.clone()));
                }
                let style = if idx == 1 {
                    theme.cost.clone()
                } else {
                    Style::new()
                };
                line.push(Segment::styled(Self::align(idx, cell, width), style));
            }
            lines.push(line);
        }

        lines
    }

    /// Plain ASCII rendering with `|` separators.
    fn render_ascii(&self) -> String {
        if self.cells.is_empty() {
            return "No queries in range".to_string();
        }

        let rows = {
            let mut ascii = self.clone();
            ascii.box_style = BoxStyle::Ascii;
            ascii.display_cells()
        };
        let widths = Self::column_widths(&rows);

        let join = |cells: Vec<String>| cells.join(" | ").trim_end().to_string();

        let mut out = Vec::with_capacity(rows.len() + 2);
        out.push(join(
            COLUMNS
                .iter()
                .zip(widths)
                .enumerate()
                .map(|(idx, (name, width))| Self::align(idx, name, width))
                .collect(),
        ));
        out.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        for row in &rows {
            out.push(join(
                row.iter()
                    .zip(widths)
                    .enumerate()
                    .map(|(idx, (cell, width))| Self::align(idx, cell, width))
                    .collect(),
            ));
        }
        out.join("\n")
    }
}

/// Display strings for one row, in `COLUMNS` order.
#[must_use]
pub fn row_cells(row: &QueryCostRow) -> [String; 12] {
    [
        row.query_id.clone(),
        format_credit_cell(row.credits_attributed_compute),
        format_timestamp_cell(row.start_time),
        format_timestamp_cell(row.end_time),
        text_cell(row.query_type.as_deref()),
        text_cell(row.schema.as_deref()),
        text_cell(row.role_user.as_deref()),
        text_cell(row.execution_status.as_deref()),
        text_cell(row.total_elapsed_time.as_deref()),
        format_count_cell(row.rows_produced),
        text_cell(row.warehouse_name.as_deref()),
        text_cell(row.query_text.as_deref()),
    ]
}

impl Renderable for CostTable {
    fn render(&self) -> String {
        lines_to_string(&self.render_segments(&create_default_theme()), false)
    }

    fn render_plain(&self) -> String {
        self.render_ascii()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rich::contains_ansi;
    use crate::test_utils::make_test_query_cost_row;

    #[test]
    fn header_lists_every_column() {
        let table = CostTable::new(&[make_test_query_cost_row("q1", Some(1.0))]);
        let plain = table.render_plain();
        let header = plain.lines().next().unwrap();
        for column in COLUMNS {
            assert!(header.contains(column), "missing {column}");
        }
    }

    #[test]
    fn rows_keep_input_order() {
        let rows = vec![
            make_test_query_cost_row("q-high", Some(9.0)),
            make_test_query_cost_row("q-low", Some(1.0)),
        ];
        let plain = CostTable::new(&rows).render_plain();
        let high = plain.find("q-high").unwrap();
        let low = plain.find("q-low").unwrap();
        assert!(high < low);
    }

    #[test]
    fn null_credits_render_as_dash() {
        let rows = vec![make_test_query_cost_row("q1", None)];
        let cells = row_cells(&rows[0]);
        assert_eq!(cells[1], "-");
    }

    #[test]
    fn long_query_text_is_truncated() {
        let mut row = make_test_query_cost_row("q1", Some(1.0));
        row.query_text = Some("SELECT ".repeat(50));
        let plain = CostTable::new(&[row]).max_text_width(20).render_plain();
        assert!(plain.contains("..."));
        assert!(!plain.contains(&"SELECT ".repeat(5)));
    }

    #[test]
    fn query_text_is_uncapped_by_default() {
        let mut row = make_test_query_cost_row("q1", Some(1.0));
        let text = format!("SELECT {}id FROM orders WHERE tail_marker = 1", "col, ".repeat(40));
        row.query_text = Some(text.clone());
        let plain = CostTable::new(&[row]).render_plain();
        assert!(plain.contains("tail_marker = 1"));
        assert!(plain.contains(&text));
    }

    #[test]
    fn empty_table_message() {
        let table = CostTable::new(&[]);
        assert!(table.is_empty());
        assert_eq!(table.render_plain(), "No queries in range");
    }

    #[test]
    fn plain_has_no_ansi_rich_does() {
        let table = CostTable::new(&[make_test_query_cost_row("q1", Some(2.5))]);
        assert!(!contains_ansi(&table.render_plain()));
        assert!(contains_ansi(&table.render()));
    }

    #[test]
    fn credits_are_right_aligned() {
        let rows = vec![
            make_test_query_cost_row("q1", Some(1234.5)),
            make_test_query_cost_row("q2", Some(1.0)),
        ];
        let plain = CostTable::new(&rows).render_plain();
        let lines: Vec<&str> = plain.lines().collect();
        let end_of = |line: &str, needle: &str| line.find(needle).map(|i| i + needle.len());
        assert_eq!(end_of(lines[2], "1,234.5000"), end_of(lines[3], "1.0000"));
    }
}
