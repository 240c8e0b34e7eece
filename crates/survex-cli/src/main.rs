//! Survey exporter CLI.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use survex_cli::logging::{LogConfig, LogFormat, init_logging};

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.write_global();
    if let Err(error) = init_logging(&logging_config(&cli)) {
        eprintln!("error: failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Export(args) => {
            let result = commands::run_export(&args)?;
            summary::print_summary(&result);
            Ok(())
        }
        Command::Formats => commands::run_formats(),
    }
}

/// Resolve the logging flags. An explicit `--log-level` beats the -v/-q
/// counters, and either one disables the `RUST_LOG` fallback.
fn logging_config(cli: &Cli) -> LogConfig {
    let level_filter = match cli.log_level {
        Some(LogLevelArg::Error) => LevelFilter::ERROR,
        Some(LogLevelArg::Warn) => LevelFilter::WARN,
        Some(LogLevelArg::Info) => LevelFilter::INFO,
        Some(LogLevelArg::Debug) => LevelFilter::DEBUG,
        Some(LogLevelArg::Trace) => LevelFilter::TRACE,
        None => cli.verbosity.tracing_level_filter(),
    };
    LogConfig {
        level_filter,
        use_env_filter: cli.log_level.is_none() && !cli.verbosity.is_present(),
        format: match cli.log_format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        },
        with_target: false,
        with_ansi: match cli.color.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
        },
        log_file: cli.log_file.clone(),
    }
}
