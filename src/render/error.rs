//! Error rendering for sfcost.
//!
//! Fatal errors go to stderr as a rich panel with fix suggestions on a
//! terminal, as a short plain text block otherwise, or as JSON in robot
//! formats.

use crate::cli::args::OutputFormat;
use crate::error::{FixSuggestion, SfcostError};
use crate::rich::{
    ThemeConfig, color_style, create_default_theme, segments_to_string, should_use_rich_output,
};
use rich_rust::prelude::*;
use rich_rust::{Segment, Style};

// =============================================================================
// Public API
// =============================================================================

/// Render an error with appropriate formatting based on terminal capabilities.
///
/// Uses rich output if the format is Human, `no_color` is unset, stderr is a
/// TTY and the rich gate allows it. JSON and Md formats get structured JSON.
#[must_use]
pub fn render_error(error: &SfcostError, format: OutputFormat, no_color: bool) -> String {
    render_error_full(error, format, no_color, false)
}

/// Render an error with explicit control over JSON pretty-printing.
#[must_use]
pub fn render_error_full(
    error: &SfcostError,
    format: OutputFormat,
    no_color: bool,
    pretty: bool,
) -> String {
    match format {
        OutputFormat::Json => return render_error_json(error, pretty),
        OutputFormat::Md => return render_error_json(error, true),
        OutputFormat::Human => {}
    }

    // Errors go to stderr, so its TTY status matters too
    let use_rich = should_use_rich_output(format, no_color) && crate::util::env::stderr_is_tty();

    if use_rich {
        render_rich(error)
    } else {
        render_simple(error)
    }
}

/// Render error as structured JSON for machine consumption.
#[must_use]
pub fn render_error_json(error: &SfcostError, pretty: bool) -> String {
    let error_json = ErrorJson::from_error(error);
    let rendered = if pretty {
        serde_json::to_string_pretty(&error_json)
    } else {
        serde_json::to_string(&error_json)
    };
    rendered.unwrap_or_else(|_| render_simple(error))
}

// =============================================================================
// Rich Terminal Rendering
// =============================================================================

fn render_rich(error: &SfcostError) -> String {
    let theme = create_default_theme();
    let suggestions = error.fix_suggestions();

    let mut lines = render_header(error, &theme);
    lines.push(vec![]);

    if !suggestions.is_empty() {
        lines.extend(render_suggestions_section(&suggestions, &theme));
    }

    if let Some(first) = suggestions.first() {
        if !first.context.is_empty() {
            lines.push(vec![]);
            lines.extend(render_wrapped_section(
                "Why this happened:",
                &first.context,
                theme.primary.clone(),
            ));
        }
        if let Some(prevention) = &first.prevention {
            lines.push(vec![]);
            lines.extend(render_wrapped_section(
                "Prevention:",
                prevention,
                color_style("green").bold(),
            ));
        }
        if let Some(doc_url) = &first.doc_url {
            lines.push(vec![]);
            lines.push(vec![
                Segment::styled("Docs: ".to_string(), theme.muted.clone()),
                Segment::styled(doc_url.clone(), Style::new().underline()),
            ]);
        }
    }

    let panel = Panel::new(lines)
        .title(Text::new(error.category().to_string()))
        .border_style(theme.panel_error_border.clone())
        .padding((1, 2));

    segments_to_string(&panel.render(78), false)
}

/// Code on its own line, then the message wrapped to the panel width.
fn render_header(error: &SfcostError, theme: &ThemeConfig) -> Vec<Vec<Segment<'static>>> {
    let mut lines = vec![vec![Segment::styled(
        format!("[{}]", error.error_code()),
        theme.muted.clone(),
    )]];
    lines.extend(
        wrap_text(&error.to_string(), 64)
            .into_iter()
            .map(|line| vec![Segment::styled(line, theme.error.clone())]),
    );
    lines
}

fn render_suggestions_section(
    suggestions: &[FixSuggestion],
    theme: &ThemeConfig,
) -> Vec<Vec<Segment<'static>>> {
    let mut lines = vec![vec![Segment::styled(
        "How to fix:".to_string(),
        theme.primary.clone(),
    )]];

    for (i, suggestion) in suggestions.iter().enumerate() {
        for (j, cmd) in suggestion.commands.iter().enumerate() {
            let prefix = if j == 0 {
                format!("  {}. ", i + 1)
            } else {
                "     Or: ".to_string()
            };
            lines.push(vec![
                Segment::plain(prefix),
                Segment::styled(cmd.clone(), color_style("cyan")),
            ]);
        }
    }

    lines
}

fn render_wrapped_section(header: &str, body: &str, style: Style) -> Vec<Vec<Segment<'static>>> {
    let mut lines = vec![vec![Segment::styled(header.to_string(), style)]];
    lines.extend(
        wrap_text(body, 64)
            .into_iter()
            .map(|line| vec![Segment::plain(format!("  {line}"))]),
    );
    lines
}

// =============================================================================
// Simple Text Rendering
// =============================================================================

/// Render error as simple text (no ANSI codes, no Unicode).
fn render_simple(error: &SfcostError) -> String {
    let suggestions = error.fix_suggestions();

    let mut lines = vec![format!("Error [{}]: {}", error.error_code(), error)];

    // First runnable command; comment lines are hints, not commands
    if let Some(cmd) = suggestions
        .first()
        .and_then(|s| s.commands.iter().find(|c| !c.starts_with('#')))
    {
        lines.push(format!("Fix: {cmd}"));
    }

    lines.join("\n")
}

// =============================================================================
// JSON Rendering
// =============================================================================

/// JSON representation of an error for machine consumption.
#[derive(serde::Serialize)]
struct ErrorJson {
    error_code: String,
    category: String,
    message: String,
    exit_code: i32,
    is_retryable: bool,
    suggestions: Vec<SuggestionJson>,
}

#[derive(serde::Serialize)]
struct SuggestionJson {
    commands: Vec<String>,
    context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    prevention: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    doc_url: Option<String>,
}

impl ErrorJson {
    fn from_error(error: &SfcostError) -> Self {
        Self {
            error_code: error.error_code().to_string(),
            category: error.category().to_string(),
            message: error.to_string(),
            exit_code: error.exit_code().into(),
            is_retryable: error.is_retryable(),
            suggestions: error
                .fix_suggestions()
                .into_iter()
                .map(|s| SuggestionJson {
                    commands: s.commands,
                    context: s.context,
                    prevention: s.prevention,
                    doc_url: s.doc_url,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Greedy word wrap.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current_line));
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

// =============================================================================
// Tests
// =============================================================================
