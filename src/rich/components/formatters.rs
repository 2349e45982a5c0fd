//! Formatting utilities for rich output components.

use chrono::{DateTime, Utc};

use crate::util::format_thousands;

/// Placeholder for NULL cells.
pub const NULL_CELL: &str = "-";

/// Decimals shown for per-query and per-warehouse credit values.
pub const CREDIT_CELL_DECIMALS: usize = 4;

/// Format an optional credit value for a table cell or bar label.
#[must_use]
pub fn format_credit_cell(value: Option<f64>) -> String {
    value.map_or_else(
        || NULL_CELL.to_string(),
        |v| format_thousands(v, CREDIT_CELL_DECIMALS),
    )
}

/// Format an optional count with thousands separators.
#[must_use]
pub fn format_count_cell(value: Option<u64>) -> String {
    #[allow(clippy::cast_precision_loss)]
    value.map_or_else(|| NULL_CELL.to_string(), |v| format_thousands(v as f64, 0))
}

/// Format an optional timestamp as `YYYY-MM-DD HH:MM:SS`.
#[must_use]
pub fn format_timestamp_cell(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(
        || NULL_CELL.to_string(),
        |ts| ts.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Text cell with NULL placeholder; whitespace runs collapse to one space.
#[must_use]
pub fn text_cell(value: Option<&str>) -> String {
    match value {
        Some(text) => text.split_whitespace().collect::<Vec<_>>().join(" "),
        None => NULL_CELL.to_string(),
    }
}

/// Truncate to at most `width` characters, marking the cut with `ellipsis`.
#[must_use]
pub fn truncate(text: &str, width: usize, ellipsis: &str) -> String {
    let len = text.chars().count();
    if len <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(ellipsis.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ellipsis);
    out
}

/// Left-align `text` in a field of `width` characters.
#[must_use]
pub fn pad_right(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(text.chars().count());
    format!("{text}{}", " ".repeat(pad))
}

/// Right-align `text` in a field of `width` characters.
#[must_use]
pub fn pad_left(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(text.chars().count());
    format!("{}{text}", " ".repeat(pad))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn credit_cell_formats_or_dashes() {
        assert_eq!(format_credit_cell(Some(1234.5)), "1,234.5000");
        assert_eq!(format_credit_cell(None), "-");
    }

    #[test]
    fn count_cell_groups_thousands() {
        assert_eq!(format_count_cell(Some(1_234_567)), "1,234,567");
        assert_eq!(format_count_cell(None), "-");
    }

    #[test]
    fn timestamp_cell_format() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_timestamp_cell(Some(ts)), "2024-01-02 03:04:05");
    }

    #[test]
    fn text_cell_collapses_whitespace() {
        assert_eq!(text_cell(Some("SELECT *\n  FROM t")), "SELECT * FROM t");
        assert_eq!(text_cell(None), "-");
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("abcdef", 10, "…"), "abcdef");
        assert_eq!(truncate("abcdef", 4, "…"), "abc…");
        assert_eq!(truncate("abcdef", 4, "..."), "a...");
        assert_eq!(truncate("ééééé", 3, "…"), "éé…");
    }

    #[test]
    fn padding_aligns() {
        assert_eq!(pad_right("ab", 4), "ab  ");
        assert_eq!(pad_left("ab", 4), "  ab");
        assert_eq!(pad_left("abcdef", 4), "abcdef");
    }
}
