//! Configuration types.

use estimatorium_common_log::LogLevel;
use serde::{Deserialize, Serialize};

/// Characters a worksheet name may not contain.
pub const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];
/// Longest worksheet name a spreadsheet accepts.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatoriumConfig {
    /// Spreadsheet report options.
    pub report: ReportConfig,
    /// Logging defaults.
    pub logging: LoggingConfig,
}

impl Default for EstimatoriumConfig {
    fn default() -> Self {
        Self {
            report: ReportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Spreadsheet report options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Worksheet name.
    pub sheet_name: String,
    /// Size columns to their content.
    pub autofit: bool,
    /// Lower bound for column widths, in characters.
    pub min_column_width: f64,
    /// Emit the timeframe table.
    pub include_durations: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            sheet_name: "Estimate".to_string(),
            autofit: true,
            min_column_width: 11.0,
            include_durations: true,
        }
    }
}

/// Logging defaults; environment variables take precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl LoggingConfig {
    pub fn level(&self) -> Option<LogLevel> {
        self.level.as_deref().and_then(LogLevel::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EstimatoriumConfig::default();
        assert_eq!(config.report.sheet_name, "Estimate");
        assert!(config.report.autofit);
        assert_eq!(config.report.min_column_width, 11.0);
        assert!(config.report.include_durations);
        assert_eq!(config.logging.level(), None);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: EstimatoriumConfig = serde_yaml::from_str("report:\n  autofit: false\n").unwrap();
        assert!(!config.report.autofit);
        assert_eq!(config.report.sheet_name, "Estimate");
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_serializes_sections() {
        let yaml = serde_yaml::to_string(&EstimatoriumConfig::default()).unwrap();
        assert!(yaml.contains("report:"));
        assert!(yaml.contains("sheet_name: Estimate"));
        assert!(yaml.contains("logging:"));
    }

    #[test]
    fn test_logging_level() {
        let logging = LoggingConfig {
            level: Some("Debug".to_string()),
        };
        assert_eq!(logging.level(), Some(LogLevel::Debug));
    }
}
