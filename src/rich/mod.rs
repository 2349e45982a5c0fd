//! Rich output module - wraps rich_rust for sfcost-specific use.
//!
//! This module provides the safety gate that decides when styled terminal
//! output is allowed. Reports are often piped into files or other tools, so
//! anything that is not an interactive terminal gets plain text.
//!
//! ## Theme System
//!
//! - **default**: colors with rounded box drawing
//! - **ascii**: colors with ASCII-only borders and bars
//!
//! Theme selection priority:
//! 1. Environment variable `SFCOST_THEME`
//! 2. Auto-detection based on terminal capabilities
//! 3. Default theme

pub mod components;

use crate::cli::args::OutputFormat;
use crate::util::env as env_util;
use regex::Regex;
use std::sync::LazyLock;

pub use rich_rust::prelude::*;
use rich_rust::{ColorSystem, Segment};

const THEME_ENV: &str = "SFCOST_THEME";

/// Check if terminal supports Unicode.
#[must_use]
pub fn has_unicode_support() -> bool {
    let lang = std::env::var("LANG").unwrap_or_default();
    let lc_all = std::env::var("LC_ALL").unwrap_or_default();

    [lang, lc_all].iter().any(|value| {
        let upper = value.to_uppercase();
        upper.contains("UTF-8") || upper.contains("UTF8")
    })
}

// =============================================================================
// Box Drawing Characters
// =============================================================================

/// Box drawing style for panels and tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoxStyle {
    /// Rounded corners: ╭─╮ (default for modern terminals).
    #[default]
    Rounded,
    /// ASCII only: +-+ (for legacy terminals).
    Ascii,
}

/// Glyphs used by bars and rules for a box style.
#[derive(Debug, Clone, Copy)]
pub struct Glyphs {
    pub horizontal: char,
    pub vertical: char,
    pub bar_fill: char,
    pub warning: &'static str,
}

impl BoxStyle {
    #[must_use]
    pub const fn glyphs(self) -> Glyphs {
        match self {
            Self::Rounded => Glyphs {
                horizontal: '─',
                vertical: '│',
                bar_fill: '█',
                warning: "⚠",
            },
            Self::Ascii => Glyphs {
                horizontal: '-',
                vertical: '|',
                bar_fill: '#',
                warning: "!",
            },
        }
    }
}

// =============================================================================
// Theme Configuration
// =============================================================================

/// Styles shared by the page components.
#[derive(Debug, Clone)]
pub struct ThemeConfig {
    /// Theme name identifier.
    pub name: String,

    /// Primary accent color (titles, bars).
    pub primary: Style,
    /// Warning color.
    pub warning: Style,
    /// Error/danger color.
    pub error: Style,
    /// Muted/dimmed color.
    pub muted: Style,

    /// Table header style.
    pub table_header: Style,
    /// Panel title style.
    pub panel_title: Style,
    /// Panel border style.
    pub panel_border: Style,
    /// Error panel border style.
    pub panel_error_border: Style,

    /// Credit values.
    pub cost: Style,
    /// Numeric counts.
    pub count: Style,

    /// Box character style.
    pub box_style: BoxStyle,
}

/// Parse a color name, `None` when rich_rust does not know it.
#[must_use]
pub fn parse_color(name: &str) -> Option<Color> {
    Color::parse(name).ok()
}

/// A style carrying only a foreground color; unstyled if the name is unknown.
#[must_use]
pub fn color_style(name: &str) -> Style {
    parse_color(name).map_or_else(Style::null, |color| Style::new().color(color))
}

fn build_theme(name: &str, box_style: BoxStyle) -> ThemeConfig {
    ThemeConfig {
        name: name.to_string(),

        primary: color_style("cyan").bold(),
        warning: color_style("yellow").bold(),
        error: color_style("red").bold(),
        muted: Style::new().dim(),

        table_header: Style::new().bold().underline(),
        panel_title: color_style("cyan").bold(),
        panel_border: color_style("blue"),
        panel_error_border: color_style("red"),

        cost: color_style("green").bold(),
        count: color_style("cyan"),

        box_style,
    }
}

/// Default theme with Unicode box drawing.
#[must_use]
pub fn create_default_theme() -> ThemeConfig {
    build_theme("default", BoxStyle::Rounded)
}

/// ASCII theme for terminals without Unicode.
#[must_use]
pub fn create_ascii_theme() -> ThemeConfig {
    build_theme("ascii", BoxStyle::Ascii)
}

/// Resolve the theme from `SFCOST_THEME` or terminal capabilities.
#[must_use]
pub fn get_theme_config() -> ThemeConfig {
    if let Some(name) = env_util::non_empty_var(THEME_ENV) {
        tracing::debug!(source = "env_var", theme = %name, "Theme selected via SFCOST_THEME");
        return match name.to_lowercase().as_str() {
            "ascii" => create_ascii_theme(),
            "default" => create_default_theme(),
            other => {
                tracing::warn!(theme = %other, "Unknown theme, using default");
                create_default_theme()
            }
        };
    }

    if !has_unicode_support() {
        tracing::debug!(
            source = "auto_detect",
            reason = "no_unicode",
            "Using ASCII theme"
        );
        return create_ascii_theme();
    }

    tracing::debug!(source = "default", "Using default theme");
    create_default_theme()
}

// =============================================================================
// Safety Gate
// =============================================================================

/// Regex for stripping rich markup tags.
static MARKUP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // Named tags and the bare closer [/], but not array indices like [0]
    Regex::new(r"\[(?:/|/?[a-zA-Z_#][a-zA-Z0-9_# (),]*)\]").unwrap()
});

/// Regex for stripping ANSI escape sequences.
static ANSI_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());

/// Central safety gate - determines if rich output is allowed.
///
/// Returns `false` (plain output) when ANY of these conditions are true:
/// 1. `format` is not `Human` (JSON/MD mode)
/// 2. `--no-color` flag is set
/// 3. `NO_COLOR` env var is set (any value, per <https://no-color.org/>)
/// 4. `SFCOST_PLAIN` env var is set
/// 5. stdout is not a TTY (piped or redirected)
/// 6. `TERM=dumb`
/// 7. `CI` env var is set
/// 8. `GITHUB_ACTIONS` env var is set
#[must_use]
pub fn should_use_rich_output(format: OutputFormat, no_color_flag: bool) -> bool {
    if format != OutputFormat::Human {
        tracing::debug!(
            reason = "robot_mode",
            decision = "disabled",
            "Rich output DISABLED: non-Human format"
        );
        return false;
    }

    if no_color_flag {
        tracing::debug!(
            reason = "no_color_flag",
            decision = "disabled",
            "Rich output DISABLED: --no-color flag"
        );
        return false;
    }

    // Any value, including empty, disables color
    if std::env::var("NO_COLOR").is_ok() {
        tracing::debug!(
            reason = "no_color_env",
            decision = "disabled",
            "Rich output DISABLED: NO_COLOR set"
        );
        return false;
    }

    if std::env::var("SFCOST_PLAIN").is_ok() {
        tracing::debug!(
            reason = "sfcost_plain",
            decision = "disabled",
            "Rich output DISABLED: SFCOST_PLAIN set"
        );
        return false;
    }

    if !env_util::stdout_is_tty() {
        tracing::debug!(
            reason = "not_tty",
            decision = "disabled",
            "Rich output DISABLED: stdout not TTY"
        );
        return false;
    }

    if std::env::var("TERM").is_ok_and(|t| t == "dumb") {
        tracing::debug!(
            reason = "term_dumb",
            decision = "disabled",
            "Rich output DISABLED: TERM=dumb"
        );
        return false;
    }

    if std::env::var("CI").is_ok() {
        tracing::debug!(
            reason = "ci_environment",
            decision = "disabled",
            "Rich output DISABLED: CI environment"
        );
        return false;
    }

    if std::env::var("GITHUB_ACTIONS").is_ok() {
        tracing::debug!(
            reason = "github_actions",
            decision = "disabled",
            "Rich output DISABLED: GITHUB_ACTIONS set"
        );
        return false;
    }

    tracing::debug!(decision = "enabled", "Rich output ENABLED");
    true
}

/// Remove rich markup tags from text, preserving content.
///
/// Does NOT remove array indices like `[0]` or brackets without markup syntax.
#[must_use]
pub fn strip_markup(text: &str) -> String {
    MARKUP_REGEX.replace_all(text, "").to_string()
}

/// Strip markup AND any ANSI escape codes that might have leaked through.
#[must_use]
pub fn strip_all_formatting(text: &str) -> String {
    let no_markup = strip_markup(text);
    ANSI_REGEX.replace_all(&no_markup, "").to_string()
}

/// Check if text contains ANSI escape codes.
#[must_use]
pub fn contains_ansi(text: &str) -> bool {
    text.contains("\x1b[")
}

/// Convert segments to a string, applying styles as ANSI codes unless `no_color`.
#[must_use]
pub fn segments_to_string(segments: &[Segment], no_color: bool) -> String {
    segments
        .iter()
        .map(|seg| match &seg.style {
            Some(style) if !no_color => style.render(&seg.text, ColorSystem::TrueColor),
            _ => seg.text.to_string(),
        })
        .collect()
}

/// Join segment lines into one string with trailing newlines.
#[must_use]
pub fn lines_to_string(lines: &[Vec<Segment>], no_color: bool) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&segments_to_string(line, no_color));
        out.push('\n');
    }
    out
}

/// Trait for components that can render in both rich and plain modes.
pub trait Renderable {
    /// Render with rich formatting (may contain ANSI codes).
    fn render(&self) -> String;

    /// Render as plain text (MUST NOT contain ANSI codes or markup).
    fn render_plain(&self) -> String;
}
