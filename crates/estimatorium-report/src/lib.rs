//! Spreadsheet reports for Estimatorium projects.

pub mod cells;
pub mod error;
pub mod excel;

pub use error::{ReportError, Result};
pub use excel::ExcelReport;
