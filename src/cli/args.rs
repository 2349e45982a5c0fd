//! CLI argument definitions using clap.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use crate::core::date_range::{DateRangeInput, parse_date, parse_range_arg};
use crate::error::Result;

/// Snowflake cost attribution - credits, jobs, storage and per-query cost.
#[derive(Parser, Debug)]
#[command(name = "sfcost")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    // === Global flags ===
    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (overrides SFCOST_CONFIG)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Account URL, e.g. https://myorg-myaccount.snowflakecomputing.com
    #[arg(long, value_name = "URL", global = true)]
    pub account_url: Option<String>,

    /// Warehouse to run the statements on
    #[arg(long, value_name = "NAME", global = true)]
    pub warehouse: Option<String>,

    /// Role to run the statements as
    #[arg(long, value_name = "NAME", global = true)]
    pub role: Option<String>,

    /// Per-statement timeout in seconds
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,
}

impl Cli {
    /// Resolve the effective output format.
    #[must_use]
    pub fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the cost page once (default command)
    Report(ReportArgs),

    /// Interactive dashboard with a date-range picker
    Dashboard(DashboardArgs),

    /// Print shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the `report` command.
#[derive(Parser, Debug, Default)]
pub struct ReportArgs {
    /// First day of the range (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", conflicts_with = "range")]
    pub start: Option<String>,

    /// Last day of the range (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", conflicts_with = "range")]
    pub end: Option<String>,

    /// Range as START..END; an empty side means the date is not chosen
    #[arg(long, value_name = "START..END")]
    pub range: Option<String>,
}

impl ReportArgs {
    /// Picker state after applying the flags over the default range.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SfcostError::InvalidDate`] for unparseable dates.
    pub fn date_input(&self, today: NaiveDate, lookback_days: u32) -> Result<DateRangeInput> {
        if let Some(range) = &self.range {
            return parse_range_arg(range);
        }
        bounds_or_default(self.start.as_deref(), self.end.as_deref(), today, lookback_days)
    }
}

/// Arguments for the `dashboard` command.
#[derive(Parser, Debug, Default)]
pub struct DashboardArgs {
    /// Initial first day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub start: Option<String>,

    /// Initial last day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub end: Option<String>,
}

impl DashboardArgs {
    /// Initial picker state.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SfcostError::InvalidDate`] for unparseable dates.
    pub fn date_input(&self, today: NaiveDate, lookback_days: u32) -> Result<DateRangeInput> {
        bounds_or_default(self.start.as_deref(), self.end.as_deref(), today, lookback_days)
    }
}

fn bounds_or_default(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
    lookback_days: u32,
) -> Result<DateRangeInput> {
    let defaults = DateRangeInput::default_for(today, lookback_days);
    let start = start.map(parse_date).transpose()?.or(defaults.start);
    let end = end.map(parse_date).transpose()?.or(defaults.end);
    Ok(DateRangeInput::new(start, end))
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Human,
    /// JSON output for machine consumption
    Json,
    /// Markdown output
    Md,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn json_flag_wins_over_format() {
        let cli = Cli::parse_from(["sfcost", "--format", "md", "--json"]);
        assert_eq!(cli.effective_format(), OutputFormat::Json);
    }

    #[test]
    fn report_flags_parse() {
        let cli = Cli::parse_from([
            "sfcost",
            "report",
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-31",
            "--warehouse",
            "REPORTING_WH",
        ]);
        let Some(Commands::Report(args)) = cli.command else {
            panic!("expected report");
        };
        assert_eq!(cli.warehouse.as_deref(), Some("REPORTING_WH"));
        let input = args.date_input(d("2024-02-01"), 31).unwrap();
        assert_eq!(input.start, Some(d("2024-01-01")));
        assert_eq!(input.end, Some(d("2024-01-31")));
    }

    #[test]
    fn range_conflicts_with_start() {
        let result = Cli::try_parse_from([
            "sfcost",
            "report",
            "--start",
            "2024-01-01",
            "--range",
            "2024-01-01..2024-01-31",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn absent_flags_take_default_range() {
        let input = ReportArgs::default().date_input(d("2024-03-01"), 31).unwrap();
        assert_eq!(input.start, Some(d("2024-01-30")));
        assert_eq!(input.end, Some(d("2024-03-01")));
    }

    #[test]
    fn open_range_is_partial() {
        let args = ReportArgs {
            range: Some("2024-01-01..".to_string()),
            ..ReportArgs::default()
        };
        let input = args.date_input(d("2024-03-01"), 31).unwrap();
        assert!(input.end.is_none());
    }

    #[test]
    fn bad_date_is_rejected() {
        let args = ReportArgs {
            start: Some("01/01/2024".to_string()),
            ..ReportArgs::default()
        };
        assert!(args.date_input(d("2024-03-01"), 31).is_err());
    }
}
