//! Report rendering errors.

use thiserror::Error;

/// Errors from rendering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("project has no tasks to report")]
    EmptyProject,

    #[error("formula of '{resource}' is part of a reference cycle")]
    CircularFormula { resource: String },

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

pub type Result<T> = std::result::Result<T, ReportError>;
