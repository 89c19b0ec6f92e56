//! Configuration file loading and parsing.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::types::{EstimatoriumConfig, FORBIDDEN_SHEET_CHARS, MAX_SHEET_NAME_LEN};
use estimatorium_common_log::LogLevel;

/// Config file location relative to a project directory.
pub const CONFIG_FILE: &str = ".estimatorium/config.yaml";

/// Environment variable naming an explicit config file.
pub const ENV_CONFIG: &str = "ESTIMATORIUM_CONFIG";

static ENV_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").unwrap());

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

/// Where the configuration comes from.
#[derive(Debug, Clone)]
enum Source {
    /// `.estimatorium/config.yaml` under a directory; optional.
    ProjectDir(PathBuf),
    /// A file named explicitly; must exist.
    File(PathBuf),
}

/// Configuration loader.
pub struct ConfigLoader {
    source: Source,
}

impl ConfigLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            source: Source::ProjectDir(project_dir.as_ref().to_path_buf()),
        }
    }

    /// Create a loader for an explicit file, which must exist.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self {
            source: Source::File(path.as_ref().to_path_buf()),
        }
    }

    /// Path the configuration is read from and saved to.
    pub fn path(&self) -> PathBuf {
        match &self.source {
            Source::ProjectDir(dir) => dir.join(CONFIG_FILE),
            Source::File(path) => path.clone(),
        }
    }

    /// Load configuration, falling back to defaults when a project
    /// directory has no config file.
    pub fn load(&self) -> Result<EstimatoriumConfig, ConfigError> {
        let config_path = self.path();

        if !config_path.exists() {
            return match self.source {
                Source::ProjectDir(_) => Ok(EstimatoriumConfig::default()),
                Source::File(_) => Err(ConfigError::NotFound { path: config_path }),
            };
        }

        let contents = std::fs::read_to_string(&config_path)?;
        self.load_str(&contents)
    }

    /// Parse configuration text, expanding environment references first.
    pub fn load_str(&self, contents: &str) -> Result<EstimatoriumConfig, ConfigError> {
        let expanded = expand_env_vars(contents)?;

        // An empty or comment-only file deserializes to YAML null.
        if expanded.lines().all(|l| l.trim().is_empty() || l.trim_start().starts_with('#')) {
            return Ok(EstimatoriumConfig::default());
        }

        let config: EstimatoriumConfig =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        validate(&config)?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self, config: &EstimatoriumConfig) -> Result<(), ConfigError> {
        validate(config)?;

        let config_path = self.path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(config_path, yaml)?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        match std::env::var(ENV_CONFIG) {
            Ok(path) if !path.is_empty() => Self::from_file(path),
            _ => Self::new(std::env::current_dir().unwrap_or_default()),
        }
    }
}

/// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
pub fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(content.len());
    let mut last = 0;

    for cap in ENV_REF.captures_iter(content) {
        let (Some(full), Some(var)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let value = match std::env::var(var.as_str()) {
            Ok(v) => v,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                None => {
                    return Err(ConfigError::EnvVarNotFound {
                        var: var.as_str().to_string(),
                    })
                }
            },
        };
        result.push_str(&content[last..full.start()]);
        result.push_str(&value);
        last = full.end();
    }

    result.push_str(&content[last..]);
    Ok(result)
}

/// Validate configuration values.
pub fn validate(config: &EstimatoriumConfig) -> Result<(), ConfigError> {
    let report = &config.report;

    let name_len = report.sheet_name.chars().count();
    if name_len == 0 || name_len > MAX_SHEET_NAME_LEN {
        return Err(ConfigError::ValidationError {
            message: format!("report.sheet_name must be 1 to {MAX_SHEET_NAME_LEN} characters"),
        });
    }
    if let Some(c) = report.sheet_name.chars().find(|c| FORBIDDEN_SHEET_CHARS.contains(c)) {
        return Err(ConfigError::ValidationError {
            message: format!("report.sheet_name must not contain '{c}'"),
        });
    }

    if !(report.min_column_width.is_finite() && report.min_column_width > 0.0) {
        return Err(ConfigError::ValidationError {
            message: "report.min_column_width must be greater than 0".to_string(),
        });
    }

    if let Some(level) = &config.logging.level {
        if LogLevel::parse(level).is_none() {
            return Err(ConfigError::ValidationError {
                message: format!("logging.level '{level}' is not one of trace, debug, info, warn, error"),
            });
        }
    }

    Ok(())
}
