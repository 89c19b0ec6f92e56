//! Closed vocabularies: currencies, time units and durations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const WORKING_HOURS_A_DAY: u32 = 8;
pub const WORKING_DAYS_IN_WEEK: u32 = 5;
pub const WORKING_DAYS_IN_MONTH: u32 = 21;

/// A name that is not part of a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownName {
    pub kind: &'static str,
    pub value: String,
}

/// Billing currency of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 2] = [Currency::Usd, Currency::Eur];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }

    /// Symbol used in spreadsheet number formats.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Eur => "€",
        }
    }

    /// Case-insensitive lookup.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownName {
            kind: "currency",
            value: s.to_string(),
        })
    }
}

/// Unit in which task efforts and durations are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hr,
    Day,
    Week,
    #[serde(rename = "mth")]
    Month,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 4] = [TimeUnit::Hr, TimeUnit::Day, TimeUnit::Week, TimeUnit::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hr => "hr",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "mth",
        }
    }

    /// Working hours in one unit.
    pub fn hours(&self) -> u32 {
        match self {
            Self::Hr => 1,
            Self::Day => WORKING_HOURS_A_DAY,
            Self::Week => WORKING_DAYS_IN_WEEK * WORKING_HOURS_A_DAY,
            Self::Month => WORKING_DAYS_IN_MONTH * WORKING_HOURS_A_DAY,
        }
    }

    /// Exact lookup against the canonical names.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.as_str() == s)
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownName {
            kind: "time unit",
            value: s.to_string(),
        })
    }
}

/// Suffixes accepted by [`Duration::parse`], longest first so that no token is
/// shadowed by a shorter one that happens to be its suffix.
const DURATION_SUFFIXES: [(&str, TimeUnit); 6] = [
    ("month", TimeUnit::Month),
    ("hour", TimeUnit::Hr),
    ("week", TimeUnit::Week),
    ("day", TimeUnit::Day),
    ("mth", TimeUnit::Month),
    ("hr", TimeUnit::Hr),
];

/// Errors from parsing a duration string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("'{0}' does not end with a time unit (hr, day, week, mth)")]
    MissingUnit(String),

    #[error("'{input}': '{magnitude}' is not a non-negative number")]
    InvalidMagnitude { input: String, magnitude: String },
}

/// A magnitude paired with a time unit, e.g. `3mth` or `.5 weeks`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Duration {
    pub magnitude: f64,
    pub unit: TimeUnit,
}

impl Duration {
    pub fn new(magnitude: f64, unit: TimeUnit) -> Self {
        Self { magnitude, unit }
    }

    pub fn hours(&self) -> f64 {
        self.magnitude * f64::from(self.unit.hours())
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude == 0.0
    }

    /// Parse strings such as `10mth`, `3 days` or `.5weeks`.
    ///
    /// The unit is matched as a suffix (bare or with a trailing `s`), then the
    /// remaining prefix must be a finite, non-negative number.
    pub fn parse(input: &str) -> Result<Self, DurationError> {
        let trimmed = input.trim();

        for (token, unit) in DURATION_SUFFIXES {
            let plural = format!("{token}s");
            let rest = trimmed
                .strip_suffix(plural.as_str())
                .or_else(|| trimmed.strip_suffix(token));

            if let Some(rest) = rest {
                let magnitude_str = rest.trim();
                return match magnitude_str.parse::<f64>() {
                    Ok(magnitude) if magnitude.is_finite() && magnitude >= 0.0 => {
                        Ok(Self { magnitude, unit })
                    }
                    _ => Err(DurationError::InvalidMagnitude {
                        input: trimmed.to_string(),
                        magnitude: magnitude_str.to_string(),
                    }),
                };
            }
        }

        Err(DurationError::MissingUnit(trimmed.to_string()))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit)
    }
}

impl FromStr for Duration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
