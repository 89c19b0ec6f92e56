//! Spans wrapping the stages of one estimation run.

use std::path::Path;

use tracing::{info_span, Span};

/// Span for reading and validating an estimation document.
pub fn document_span(path: &Path) -> Span {
    info_span!(
        "document",
        path = %path.display(),
        error = tracing::field::Empty
    )
}

/// Span for writing a report.
pub fn report_span(path: &Path) -> Span {
    info_span!(
        "report",
        path = %path.display(),
        error = tracing::field::Empty
    )
}

/// Record an error on the current span, if it declares an `error` field.
pub fn record_error(error: &dyn std::error::Error) {
    Span::current().record("error", tracing::field::display(error));
}
