//! Estimatorium CLI
//!
//! Main entry point for the `estimatorium` binary.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use estimatorium_common_config::EstimatoriumConfig;
use estimatorium_common_log::{self as log, spans, LogConfig, LogLevel};
use estimatorium_core::{project_from_str, size_team, Project};
use estimatorium_report::ExcelReport;

mod cli;
mod error;
mod output;

use cli::Cli;
use error::CliError;
use output::{write_output, SizingSummary};

/// Application exit codes
#[repr(u8)]
pub enum Exit {
    Success = 0,
    InvalidProject = 1,
    GeneralError = 2,
    ConfigError = 3,
    IoError = 4,
    ReportError = 5,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => Exit::Success.into(),
        Err(e) => {
            for line in e.report_lines() {
                eprintln!("{line}");
            }
            e.exit_code().into()
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.load_config()?;
    init_logging(&cli, &config)?;
    debug!(?config, "configuration loaded");

    let project = load_project(&cli)?;

    write_output(cli.format, &SizingSummary::new(&project), io::stdout().lock())?;

    match &cli.output_file {
        Some(path) if !cli.check => {
            let span = spans::report_span(path);
            let _guard = span.enter();
            ExcelReport::new(&config.report)
                .render(&project, path)
                .map_err(|source| {
                    spans::record_error(&source);
                    CliError::Report {
                        path: path.clone(),
                        source,
                    }
                })?;
        }
        _ => debug!("check only, no report written"),
    }

    Ok(())
}

/// Read, validate and size the estimation document.
fn load_project(cli: &Cli) -> Result<Project, CliError> {
    let path = &cli.project_file;
    let span = spans::document_span(path);
    let _guard = span.enter();

    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::io_with_path(format!("cannot read {}", path.display()), e, path))?;

    let mut project = project_from_str(&content)
        .into_result()
        .map_err(|errors| {
            let err = CliError::Invalid {
                path: path.clone(),
                errors,
            };
            spans::record_error(&err);
            err
        })?;

    size_team(&mut project);
    Ok(project)
}

/// `--quiet` keeps errors only; each `--verbose` raises the level one step
/// above the config file's (or the default) level.
fn init_logging(cli: &Cli, config: &EstimatoriumConfig) -> Result<(), CliError> {
    let base = config.logging.level().unwrap_or_default();
    let mut log_config = LogConfig::from_env_or(base);

    if cli.quiet {
        log_config = log_config.with_level(LogLevel::Error);
    } else if cli.verbose > 0 {
        let level = LogLevel::from_verbosity(log_config.level, cli.verbose);
        log_config = log_config.with_level(level);
    }

    log::init(log_config)?;
    Ok(())
}
