//! CLI argument definitions using clap derive macros.

use std::path::{Path, PathBuf};

use clap::{Arg, ArgAction, Parser, ValueHint};

use estimatorium_common_config::{ConfigLoader, EstimatoriumConfig, ENV_CONFIG};

use crate::error::CliError;

/// Estimatorium - team sizing from plain-text estimates
///
/// Reads an estimation document, sizes the team against the desired
/// duration and writes the estimate as an XLSX workbook.
#[derive(Debug, Parser)]
#[command(
    name = "estimatorium",
    author,
    version,
    about,
    long_about = None,
    arg_required_else_help = true,
    disable_version_flag = true,
    arg = Arg::new("version")
        .short('v')
        .long("version")
        .action(ArgAction::Version)
        .help("Print version"),
    help_template = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
"
)]
pub struct Cli {
    /// Estimation document to read
    #[arg(value_name = "PROJECT_FILE", value_hint = ValueHint::FilePath)]
    pub project_file: PathBuf,

    /// Workbook to write
    #[arg(
        value_name = "OUTPUT_FILE",
        value_hint = ValueHint::FilePath,
        required_unless_present = "check"
    )]
    pub output_file: Option<PathBuf>,

    /// Validate and size the project without writing a report
    #[arg(long)]
    pub check: bool,

    /// Increase verbosity level (--verbose, --verbose --verbose)
    #[arg(long, action = ArgAction::Count, help = "Increase verbosity level")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(
        short,
        long,
        conflicts_with = "verbose",
        help = "Suppress non-error output"
    )]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(
        short,
        long,
        env = ENV_CONFIG,
        value_hint = ValueHint::FilePath,
        help = "Path to configuration file"
    )]
    pub config: Option<PathBuf>,

    /// Summary format
    #[arg(
        long,
        default_value = "text",
        value_enum,
        help = "Summary format (text, json)"
    )]
    pub format: OutputFormat,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Cli {
    /// Load configuration from `--config`, or from the directory holding
    /// the project file.
    pub fn load_config(&self) -> Result<EstimatoriumConfig, CliError> {
        let loader = match &self.config {
            Some(path) => ConfigLoader::from_file(path),
            None => ConfigLoader::new(project_dir(&self.project_file)),
        };

        loader.load().map_err(|e| CliError::Config {
            message: format!("cannot load {}", loader.path().display()),
            source: e,
        })
    }
}

fn project_dir(project_file: &Path) -> &Path {
    match project_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_positionals() {
        let cli = Cli::try_parse_from(["estimatorium", "plan.est", "plan.xlsx"]).unwrap();
        assert_eq!(cli.project_file, PathBuf::from("plan.est"));
        assert_eq!(cli.output_file, Some(PathBuf::from("plan.xlsx")));
        assert!(!cli.check);
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn test_check_needs_no_output() {
        let cli = Cli::try_parse_from(["estimatorium", "--check", "plan.est"]).unwrap();
        assert!(cli.check);
        assert_eq!(cli.output_file, None);
    }

    #[test]
    fn test_output_required_without_check() {
        assert!(Cli::try_parse_from(["estimatorium", "plan.est"]).is_err());
        assert!(Cli::try_parse_from(["estimatorium", "a", "b", "c"]).is_err());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        let cli = Cli::try_parse_from(["estimatorium", "--verbose", "--verbose", "a", "b"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(Cli::try_parse_from(["estimatorium", "--verbose", "-q", "a", "b"]).is_err());
    }

    #[test]
    fn test_short_v_is_version() {
        let err = Cli::try_parse_from(["estimatorium", "-v"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_project_dir() {
        assert_eq!(project_dir(Path::new("plan.est")), Path::new("."));
        assert_eq!(project_dir(Path::new("plans/q3.est")), Path::new("plans"));
    }
}
