//! Non-fatal conditions raised while computing bounds.
//!
//! Warnings are returned as data alongside each security's result so the
//! caller decides how to report them.

use crate::types::{Price, SecurityId};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::fmt;

/// A recoverable condition for one security.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Warning {
    /// Fewer trading dates than requested; the window uses what exists.
    InsufficientHistory {
        security_id: SecurityId,
        available: usize,
        requested: usize,
    },
    /// No entry in the open-price table; the security is skipped.
    MissingOpenPrice { security_id: SecurityId },
    /// Empty window; both references degrade to today's open.
    NoPriorClose {
        security_id: SecurityId,
        fallback: Price,
    },
    /// The latest date lacks the closing minute; an earlier minute was used.
    PriorCloseSubstituted {
        security_id: SecurityId,
        date: NaiveDate,
        used_time: NaiveTime,
    },
    /// A window date has no daily-open minute; its samples are excluded.
    MissingDailyOpen {
        security_id: SecurityId,
        date: NaiveDate,
    },
    /// No minute survived profiling; no bounds are produced.
    EmptyProfile { security_id: SecurityId },
}

impl Warning {
    /// Stable identifier of the warning kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Warning::InsufficientHistory { .. } => "InsufficientHistory",
            Warning::MissingOpenPrice { .. } => "MissingOpenPrice",
            Warning::NoPriorClose { .. } => "NoPriorClose",
            Warning::PriorCloseSubstituted { .. } => "PriorCloseSubstituted",
            Warning::MissingDailyOpen { .. } => "MissingDailyOpen",
            Warning::EmptyProfile { .. } => "EmptyProfile",
        }
    }

    /// Security the warning refers to.
    pub fn security_id(&self) -> &SecurityId {
        match self {
            Warning::InsufficientHistory { security_id, .. }
            | Warning::MissingOpenPrice { security_id }
            | Warning::NoPriorClose { security_id, .. }
            | Warning::PriorCloseSubstituted { security_id, .. }
            | Warning::MissingDailyOpen { security_id, .. }
            | Warning::EmptyProfile { security_id } => security_id,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InsufficientHistory {
                security_id,
                available,
                requested,
            } => write!(
                f,
                "{security_id}: only {available} days available, less than {requested} days requested"
            ),
            Warning::MissingOpenPrice { security_id } => {
                write!(f, "{security_id}: no opening price in reference table, skipped")
            }
            Warning::NoPriorClose {
                security_id,
                fallback,
            } => write!(
                f,
                "{security_id}: no data available for recent close price, using open price {fallback}"
            ),
            Warning::PriorCloseSubstituted {
                security_id,
                date,
                used_time,
            } => write!(
                f,
                "{security_id}: no closing minute on {}, using close at {}",
                date.format(crate::types::DATE_FORMAT),
                used_time.format(crate::types::TIME_FORMAT)
            ),
            Warning::MissingDailyOpen { security_id, date } => write!(
                f,
                "{security_id}: no opening minute on {}, day excluded from profile",
                date.format(crate::types::DATE_FORMAT)
            ),
            Warning::EmptyProfile { security_id } => {
                write!(f, "{security_id}: no trading minutes to profile, no bounds produced")
            }
        }
    }
}

/// Ordered list of warnings collected for one unit of work.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.
    pub fn push(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Append all warnings of another list.
    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    /// Warnings in the order they were raised.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check whether a warning of the given kind was recorded.
    pub fn contains_kind(&self, kind: &str) -> bool {
        self.warnings.iter().any(|w| w.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Warning;
    type IntoIter = std::vec::IntoIter<Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.warnings.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> SecurityId {
        SecurityId::canonicalize(raw).unwrap()
    }

    #[test]
    fn test_insufficient_history_message() {
        let warning = Warning::InsufficientHistory {
            security_id: id("1"),
            available: 5,
            requested: 14,
        };
        assert_eq!(warning.kind(), "InsufficientHistory");
        assert_eq!(
            warning.to_string(),
            "000001: only 5 days available, less than 14 days requested"
        );
    }

    #[test]
    fn test_diagnostics_accumulate() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());

        diagnostics.push(Warning::EmptyProfile { security_id: id("1") });
        let mut other = Diagnostics::new();
        other.push(Warning::MissingOpenPrice { security_id: id("2") });
        diagnostics.extend(other);

        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.contains_kind("MissingOpenPrice"));
        assert!(!diagnostics.contains_kind("NoPriorClose"));
        assert_eq!(diagnostics.warnings()[1].security_id().as_str(), "000002");
    }

    #[test]
    fn test_serialized_kind_tag() {
        let warning = Warning::MissingOpenPrice { security_id: id("3") };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "MissingOpenPrice");
        assert_eq!(json["security_id"], "000003");
    }
}
