//! Horizontal bar chart of credits per warehouse.

use crate::core::models::WarehouseCredits;
use crate::rich::{BoxStyle, Renderable, ThemeConfig, create_default_theme, lines_to_string};
use rich_rust::prelude::*;

use super::formatters::{format_credit_cell, pad_right};

/// One bar per warehouse; bars keep the order they were given in.
#[derive(Debug, Clone)]
pub struct CreditChart {
    bars: Vec<(String, Option<f64>)>,
    width: usize,
    box_style: BoxStyle,
}

impl CreditChart {
    #[must_use]
    pub fn new(rows: &[WarehouseCredits]) -> Self {
        Self {
            bars: rows
                .iter()
                .map(|r| (r.warehouse_name.clone(), r.total_credits_used))
                .collect(),
            width: 40,
            box_style: BoxStyle::default(),
        }
    }

    /// Width of the longest bar in characters.
    #[must_use]
    pub fn width(mut self, width: usize) -> Self {
        self.width = width.max(5);
        self
    }

    #[must_use]
    pub const fn box_style(mut self, style: BoxStyle) -> Self {
        self.box_style = style;
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    fn max_value(&self) -> f64 {
        self.bars
            .iter()
            .filter_map(|(_, v)| *v)
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }

    /// Bar length for `value`, scaled so the largest value fills `width`.
    #[must_use]
    pub fn bar_len(&self, value: Option<f64>) -> usize {
        let max = self.max_value();
        match value {
            Some(v) if v.is_finite() && v > 0.0 && max > 0.0 => {
                #[allow(clippy::cast_precision_loss)] // width is small
                let width_f = self.width as f64;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // ratio is 0-1
                let len = ((v / max) * width_f).round() as usize;
                // Any positive value stays visible
                len.max(1)
            }
            _ => 0,
        }
    }

    fn label_width(&self) -> usize {
        self.bars
            .iter()
            .map(|(name, _)| name.chars().count())
            .max()
            .unwrap_or(0)
    }

    fn lines(&self, fill: char) -> Vec<(String, String, String)> {
        let label_width = self.label_width();
        self.bars
            .iter()
            .map(|(name, value)| {
                let len = self.bar_len(*value);
                (
                    pad_right(name, label_width),
                    pad_right(&fill.to_string().repeat(len), self.width),
                    format_credit_cell(*value),
                )
            })
            .collect()
    }

    /// Render as styled lines: label, bar, value.
    #[must_use]
    pub fn render_segments(&self, theme: &ThemeConfig) -> Vec<Vec<Segment<'static>>> {
        if self.bars.is_empty() {
            return vec![vec![Segment::styled(
                "No warehouse usage in range".to_string(),
                theme.muted.clone(),
            )]];
        }

        let glyphs = self.box_style.glyphs();
        self.lines(glyphs.bar_fill)
            .into_iter()
            .map(|(label, bar, value)| {
                vec![
                    Segment::styled(label, Style::new().bold()),
                    Segment::styled(format!(" {} ", glyphs.vertical), theme.muted.clone()),
                    Segment::styled(bar, theme.primary.clone()),
                    Segment::plain(" "),
                    Segment::styled(value, theme.cost.clone()),
                ]
            })
            .collect()
    }
}

impl Renderable for CreditChart {
    fn render(&self) -> String {
        lines_to_string(&self.render_segments(&create_default_theme()), false)
    }

    fn render_plain(&self) -> String {
        if self.bars.is_empty() {
            return "No warehouse usage in range".to_string();
        }
        self.lines('#')
            .into_iter()
            .map(|(label, bar, value)| format!("{label} | {bar} {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rich::contains_ansi;
    use crate::test_utils::make_test_warehouse_credits;

    #[test]
    fn largest_bar_fills_width() {
        let chart = CreditChart::new(&[
            make_test_warehouse_credits("BIG_WH", Some(100.0)),
            make_test_warehouse_credits("SMALL_WH", Some(25.0)),
        ])
        .width(20);
        assert_eq!(chart.bar_len(Some(100.0)), 20);
        assert_eq!(chart.bar_len(Some(25.0)), 5);
    }

    #[test]
    fn tiny_and_null_values() {
        let chart = CreditChart::new(&[
            make_test_warehouse_credits("BIG_WH", Some(1000.0)),
            make_test_warehouse_credits("TINY_WH", Some(0.001)),
            make_test_warehouse_credits("NULL_WH", None),
        ]);
        assert_eq!(chart.bar_len(Some(0.001)), 1);
        assert_eq!(chart.bar_len(None), 0);
        assert!(chart.render_plain().contains("NULL_WH"));
    }

    #[test]
    fn bars_keep_descending_input_order() {
        let chart = CreditChart::new(&[
            make_test_warehouse_credits("FIRST", Some(10.0)),
            make_test_warehouse_credits("SECOND", Some(5.0)),
        ]);
        let plain = chart.render_plain();
        assert!(plain.find("FIRST").unwrap() < plain.find("SECOND").unwrap());
    }

    #[test]
    fn plain_uses_hashes_rich_uses_blocks() {
        let chart = CreditChart::new(&[make_test_warehouse_credits("WH", Some(3.0))]).width(10);
        let plain = chart.render_plain();
        assert!(plain.contains("##########"));
        assert!(!contains_ansi(&plain));

        let rich = chart.render();
        assert!(rich.contains('█'));
        assert!(contains_ansi(&rich));
    }

    #[test]
    fn all_zero_chart_has_no_bars() {
        let chart = CreditChart::new(&[make_test_warehouse_credits("IDLE", Some(0.0))]);
        assert_eq!(chart.bar_len(Some(0.0)), 0);
        assert!(!chart.render_plain().contains('#'));
    }

    #[test]
    fn empty_chart_message() {
        assert_eq!(
            CreditChart::new(&[]).render_plain(),
            "No warehouse usage in range"
        );
    }
}
