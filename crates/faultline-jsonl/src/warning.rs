//! Lines skipped while reading JSONL data.
//!
//! One corrupted ledger or node line shouldn't make the whole file
//! unreadable. Resilient readers drop the line and record a [`Warning`].

use std::fmt;

/// Why a line was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The line is text but doesn't deserialize into the record type.
    MalformedJson(String),

    /// The line isn't valid UTF-8.
    NotUtf8,
}

/// A line a resilient reader skipped.
///
/// ```
/// use faultline_jsonl::{SkipReason, Warning};
///
/// let warning = Warning::new(42, SkipReason::NotUtf8);
/// assert_eq!(warning.to_string(), "line 42: not valid UTF-8");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// 1-based line number in the file
    pub line_number: usize,

    /// What was wrong with it
    pub reason: SkipReason,
}

impl Warning {
    /// Creates a warning for `line_number`.
    #[must_use]
    pub fn new(line_number: usize, reason: SkipReason) -> Self {
        Self {
            line_number,
            reason,
        }
    }

    /// The parse error, or a short description for non-JSON problems.
    #[must_use]
    pub fn detail(&self) -> &str {
        match &self.reason {
            SkipReason::MalformedJson(error) => error,
            SkipReason::NotUtf8 => "not valid UTF-8",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            SkipReason::MalformedJson(error) => {
                write!(f, "line {}: malformed JSON ({error})", self.line_number)
            }
            SkipReason::NotUtf8 => write!(f, "line {}: not valid UTF-8", self.line_number),
        }
    }
}
