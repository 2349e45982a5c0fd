//! sfcost - Snowflake cost attribution
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};

use sfcost::cli::args::ReportArgs;
use sfcost::cli::{Cli, Commands};
use sfcost::core::logging;
use sfcost::storage::config::ResolvedConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config errors surface from the command itself; here the file only
    // contributes a default log level and output settings for errors.
    let resolved = ResolvedConfig::resolve(&cli).ok();

    let log_level = cli
        .log_level
        .as_deref()
        .and_then(logging::LogLevel::from_arg)
        .or_else(logging::parse_log_level_from_env)
        .or_else(|| {
            resolved
                .as_ref()
                .and_then(|c| c.log_level.as_deref())
                .and_then(logging::LogLevel::from_arg)
        })
        .unwrap_or_default();
    let log_format = if cli.json_output {
        logging::LogFormat::Json
    } else {
        logging::parse_log_format_from_env().unwrap_or_default()
    };
    let log_file = logging::parse_log_file_from_env();
    logging::init(log_level, log_format, log_file, cli.verbose);

    let (format, no_color, pretty) = resolved.as_ref().map_or(
        (cli.effective_format(), cli.no_color, cli.pretty),
        |c| (c.format, c.no_color, c.pretty),
    );

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), "{e}");
            let error_output =
                sfcost::render::error::render_error_full(&e, format, no_color, pretty);
            eprintln!("{error_output}");
            ExitCode::from(u8::try_from(i32::from(e.exit_code())).unwrap_or(1))
        }
    }
}

async fn run(cli: &Cli) -> sfcost::Result<()> {
    match &cli.command {
        // Default to the report over the default range
        None => sfcost::cli::report::execute(cli, &ReportArgs::default()).await,
        Some(Commands::Report(args)) => sfcost::cli::report::execute(cli, args).await,
        Some(Commands::Dashboard(args)) => sfcost::cli::dashboard::execute(cli, args).await,
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(*shell, &mut Cli::command(), "sfcost", &mut io::stdout());
            Ok(())
        }
    }
}
