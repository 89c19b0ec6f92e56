//! CLI error types and handling.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use estimatorium_common_config::ConfigError;
use estimatorium_common_log::LogError;
use estimatorium_core::ErrorList;
use estimatorium_report::ReportError;

use crate::Exit;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// The estimation document has errors
    #[error("{} error(s) in {}", errors.len(), path.display())]
    Invalid { path: PathBuf, errors: ErrorList },

    /// Configuration error
    #[error("{message}: {source}")]
    Config {
        message: String,
        #[source]
        source: ConfigError,
    },

    /// IO error
    #[error("{message}: {source}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
        path: Option<PathBuf>,
    },

    /// Report rendering error
    #[error("cannot write report {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: ReportError,
    },

    /// Logging could not be set up
    #[error(transparent)]
    Log(#[from] LogError),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> Exit {
        match self {
            Self::Invalid { .. } => Exit::InvalidProject,
            Self::Config { .. } => Exit::ConfigError,
            Self::Io { .. } => Exit::IoError,
            Self::Report { .. } => Exit::ReportError,
            Self::Log(_) | Self::Other(_) => Exit::GeneralError,
        }
    }

    /// Lines to print to stderr: one per document error, or the error
    /// itself followed by an optional hint.
    pub fn report_lines(&self) -> Vec<String> {
        match self {
            Self::Invalid { errors, .. } => errors.messages(),
            _ => {
                let mut lines = vec![format!("error: {self}")];
                if let Some(hint) = self.hint() {
                    lines.push(format!("hint: {hint}"));
                }
                lines
            }
        }
    }

    /// Get a hint for resolving the error
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                Some("check the path of the estimation document")
            }
            Self::Config {
                source: ConfigError::ParseError { .. },
                ..
            } => Some("the config file must be YAML with `report` and `logging` sections"),
            Self::Report {
                source: ReportError::EmptyProject,
                ..
            } => Some("add a `# tasks` section with at least one task"),
            _ => None,
        }
    }

    /// Create an IO error with path
    pub fn io_with_path(
        message: impl Into<String>,
        source: io::Error,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self::Io {
            message: message.into(),
            source,
            path: Some(path.into()),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
            path: None,
        }
    }
}
