//! Inline warnings for sections that failed to load.

use crate::core::models::SectionWarning;
use crate::rich::{BoxStyle, Renderable, ThemeConfig, create_default_theme, lines_to_string};
use rich_rust::prelude::*;

/// A list of `Section title: error` warnings, one per failed section.
#[derive(Debug, Clone)]
pub struct WarningPanel {
    warnings: Vec<SectionWarning>,
    box_style: BoxStyle,
}

impl WarningPanel {
    #[must_use]
    pub fn new(warnings: Vec<SectionWarning>) -> Self {
        Self {
            warnings,
            box_style: BoxStyle::default(),
        }
    }

    #[must_use]
    pub const fn box_style(mut self, style: BoxStyle) -> Self {
        self.box_style = style;
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    #[must_use]
    pub fn render_segments(&self, theme: &ThemeConfig) -> Vec<Vec<Segment<'static>>> {
        let icon = self.box_style.glyphs().warning;
        self.warnings
            .iter()
            .map(|w| {
                vec![
                    Segment::styled(format!("{icon} "), theme.warning.clone()),
                    Segment::styled(format!("{}: ", w.section.title()), theme.warning.clone()),
                    Segment::plain(w.message.clone()),
                ]
            })
            .collect()
    }
}

impl Renderable for WarningPanel {
    fn render(&self) -> String {
        lines_to_string(&self.render_segments(&create_default_theme()), false)
    }

    fn render_plain(&self) -> String {
        self.warnings
            .iter()
            .map(|w| format!("WARNING {}: {}", w.section.title(), w.message))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
