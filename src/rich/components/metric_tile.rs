//! Metric tile component for the account summary.

use crate::rich::{Renderable, ThemeConfig, create_default_theme, lines_to_string};
use rich_rust::prelude::*;

/// A single headline number with its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricTile {
    label: String,
    value: String,
}

impl MetricTile {
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Render as two styled lines: muted label, bold value.
    #[must_use]
    pub fn render_segments(&self, theme: &ThemeConfig) -> Vec<Vec<Segment<'static>>> {
        vec![
            vec![Segment::styled(self.label.clone(), theme.muted.clone())],
            vec![Segment::styled(self.value.clone(), theme.cost.clone())],
        ]
    }
}

impl Renderable for MetricTile {
    fn render(&self) -> String {
        lines_to_string(&self.render_segments(&create_default_theme()), false)
    }

    fn render_plain(&self) -> String {
        format!("{}: {}", self.label, self.value)
    }
}

/// Tiles laid out on one row, each column as wide as its widest line.
#[derive(Debug, Clone)]
pub struct TileRow {
    tiles: Vec<MetricTile>,
    gap: usize,
}

impl Default for TileRow {
    fn default() -> Self {
        Self::new()
    }
}

impl TileRow {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tiles: Vec::new(),
            gap: 4,
        }
    }

    #[must_use]
    pub fn push(mut self, tile: MetricTile) -> Self {
        self.tiles.push(tile);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    fn column_widths(&self) -> Vec<usize> {
        self.tiles
            .iter()
            .map(|t| t.label.chars().count().max(t.value.chars().count()))
            .collect()
    }

    /// Render as two lines (labels, values) of padded segments.
    #[must_use]
    pub fn render_segments(&self, theme: &ThemeConfig) -> Vec<Vec<Segment<'static>>> {
        let widths = self.column_widths();
        let gap = " ".repeat(self.gap);
        let mut labels = Vec::new();
        let mut values = Vec::new();

        for (idx, (tile, width)) in self.tiles.iter().zip(&widths).enumerate() {
            if idx > 0 {
                labels.push(Segment::plain(gap.clone()));
                values.push(Segment::plain(gap.clone()));
            }
            labels.push(Segment::styled(
                super::pad_right(&tile.label, *width),
                theme.muted.clone(),
            ));
            values.push(Segment::styled(
                super::pad_right(&tile.value, *width),
                theme.cost.clone(),
            ));
        }

        vec![labels, values]
    }
}

impl Renderable for TileRow {
    fn render(&self) -> String {
        lines_to_string(&self.render_segments(&create_default_theme()), false)
    }

    /// One `label: value` line per tile.
    fn render_plain(&self) -> String {
        self.tiles
            .iter()
            .map(Renderable::render_plain)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
