//! Error types and the multi-error aggregate threaded through parsing and building.

use std::fmt;

use thiserror::Error;

use crate::units::DurationError;

/// A single problem found in an estimation document.
///
/// Every variant carries the 1-based line the offending text came from, so a
/// report of several errors can be read top to bottom against the source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("line {line}: unknown directive '{name}'")]
    UnknownDirective { line: usize, name: String },

    #[error("line {line}: duplicate directive '{name}'")]
    DuplicateDirective { line: usize, name: String },

    #[error("line {line}: task line must have 3 parts separated by '|', found {parts}")]
    MalformedTaskLine { line: usize, parts: usize },

    #[error("line {line}: expected key=value, found '{token}'")]
    MalformedPair { line: usize, token: String },

    #[error("line {line}: unterminated quote")]
    UnterminatedQuote { line: usize },

    #[error("line {line}: unknown property '{key}' for resource '{resource}'")]
    UnknownTeamProperty {
        line: usize,
        resource: String,
        key: String,
    },

    #[error("line {line}: duplicate resource '{id}' in team")]
    DuplicateResource { line: usize, id: String },

    #[error("line {line}: duplicate effort for resource '{resource}'")]
    DuplicateEffort { line: usize, resource: String },

    #[error("line {line}: duplicate risk '{name}'")]
    DuplicateRisk { line: usize, name: String },

    #[error("line {line}: unknown time unit '{value}'")]
    UnknownTimeUnit { line: usize, value: String },

    #[error("line {line}: unknown currency '{value}'")]
    UnknownCurrency { line: usize, value: String },

    #[error("line {line}: acceptance percent must be a number between 0 and 100, got '{value}'")]
    InvalidAcceptancePercent { line: usize, value: String },

    #[error("line {line}: risk '{name}' must have a multiplier >= 1, got '{value}'")]
    InvalidRiskMultiplier {
        line: usize,
        name: String,
        value: String,
    },

    #[error("line {line}: resource '{resource}' rate must be a number >= 0, got '{value}'")]
    InvalidRate {
        line: usize,
        resource: String,
        value: String,
    },

    #[error("line {line}: resource '{resource}' count must be a non-negative integer, got '{value}'")]
    InvalidCount {
        line: usize,
        resource: String,
        value: String,
    },

    #[error("line {line}: formula of '{resource}' references unknown resource '{reference}'")]
    UnknownFormulaResource {
        line: usize,
        resource: String,
        reference: String,
    },

    #[error("line {line}: formula of '{resource}' references itself")]
    SelfReferencingFormula { line: usize, resource: String },

    #[error("line {line}: formula of '{resource}' is part of a reference cycle")]
    CircularFormula { line: usize, resource: String },

    #[error("line {line}: task '{task}' has unknown risk '{risk}'")]
    UnknownRisk {
        line: usize,
        task: String,
        risk: String,
    },

    #[error("line {line}: task '{task}' effort for '{resource}' must be a number >= 0, got '{value}'")]
    InvalidEffort {
        line: usize,
        task: String,
        resource: String,
        value: String,
    },

    #[error("line {line}: task '{task}' references unknown resource '{resource}'")]
    UnknownResource {
        line: usize,
        task: String,
        resource: String,
    },

    #[error("line {line}: invalid desired duration: {source}")]
    InvalidDuration {
        line: usize,
        #[source]
        source: DurationError,
    },
}

impl EstimateError {
    /// Source line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            Self::UnknownDirective { line, .. }
            | Self::DuplicateDirective { line, .. }
            | Self::MalformedTaskLine { line, .. }
            | Self::MalformedPair { line, .. }
            | Self::UnterminatedQuote { line }
            | Self::UnknownTeamProperty { line, .. }
            | Self::DuplicateResource { line, .. }
            | Self::DuplicateEffort { line, .. }
            | Self::DuplicateRisk { line, .. }
            | Self::UnknownTimeUnit { line, .. }
            | Self::UnknownCurrency { line, .. }
            | Self::InvalidAcceptancePercent { line, .. }
            | Self::InvalidRiskMultiplier { line, .. }
            | Self::InvalidRate { line, .. }
            | Self::InvalidCount { line, .. }
            | Self::UnknownFormulaResource { line, .. }
            | Self::SelfReferencingFormula { line, .. }
            | Self::CircularFormula { line, .. }
            | Self::UnknownRisk { line, .. }
            | Self::InvalidEffort { line, .. }
            | Self::UnknownResource { line, .. }
            | Self::InvalidDuration { line, .. } => *line,
        }
    }
}

/// Ordered collection of independent errors.
///
/// Parsing and building never stop at the first problem; they push into an
/// `ErrorList` and keep going. An empty list means the document is valid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorList {
    errors: Vec<EstimateError>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: EstimateError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EstimateError> {
        self.errors.iter()
    }

    /// Rendered messages, in the order the errors were found.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Append every error of `other` after the ones already collected.
    pub fn merge(&mut self, other: ErrorList) {
        self.errors.extend(other.errors);
    }

    /// `Ok(value)` when no error was collected, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, ErrorList> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorList {}

impl From<EstimateError> for ErrorList {
    fn from(error: EstimateError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl Extend<EstimateError> for ErrorList {
    fn extend<I: IntoIterator<Item = EstimateError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl FromIterator<EstimateError> for ErrorList {
    fn from_iter<I: IntoIterator<Item = EstimateError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ErrorList {
    type Item = EstimateError;
    type IntoIter = std::vec::IntoIter<EstimateError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a EstimateError;
    type IntoIter = std::slice::Iter<'a, EstimateError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// A best-effort value together with every error found while producing it.
///
/// The value is always present so callers can show partial results, but it is
/// only guaranteed valid when `errors` is empty.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub errors: ErrorList,
}

impl<T> Outcome<T> {
    pub fn new(value: T, errors: ErrorList) -> Self {
        Self { value, errors }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<T, ErrorList> {
        self.errors.into_result(self.value)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            errors: self.errors,
        }
    }
}
