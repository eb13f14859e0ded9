//! PO number format and allocation arithmetic.
//!
//! Parents are `YYMM-NNNN`, children of a Recurring parent are
//! `YYMM-NNNN-NN`. The store supplies the numbers already in use; the
//! functions here produce candidates in the order they should be tried.

use backoffice_shared::{AppError, ErrorKind};
use chrono::{DateTime, Datelike, Utc};
use std::collections::BTreeSet;
use thiserror::Error;

/// Highest parent sequence allocated per month.
pub const MAX_PARENT_SEQUENCE: u32 = 5999;

/// Highest child suffix per parent.
pub const MAX_CHILD_SUFFIX: u32 = 99;

/// Errors from PO number allocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoNumberError {
    /// No unused number remains.
    #[error("No purchase order numbers remain for {0}")]
    Exhausted(String),

    /// Child allocation referenced a missing parent.
    #[error("Parent purchase order not found")]
    ParentNotFound,

    /// Parent has not been numbered yet.
    #[error("Parent purchase order has no PO number")]
    ParentMissingNumber,

    /// Child numbers hang off Recurring parents only.
    #[error("Child purchase orders require a Recurring parent")]
    ParentNotRecurring,

    /// Wrapped store error.
    #[error("{message}")]
    Database {
        /// Operation-specific code.
        code: &'static str,
        /// Store message.
        message: String,
    },
}

impl PoNumberError {
    /// Wraps a store error under `code`.
    pub fn database(code: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Database {
            code,
            message: err.to_string(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Exhausted(_) => "po_number_exhausted",
            Self::ParentNotFound => "parent_po_not_found",
            Self::ParentMissingNumber => "parent_po_missing_number",
            Self::ParentNotRecurring => "parent_po_not_recurring",
            Self::Database { code, .. } => code,
        }
    }

    /// Returns the taxonomy kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Exhausted(_) => ErrorKind::ResourceExhaustion,
            Self::ParentNotFound | Self::ParentMissingNumber | Self::ParentNotRecurring => {
                ErrorKind::StatePrecondition
            }
            Self::Database { .. } => ErrorKind::Downstream,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }
}

impl From<PoNumberError> for AppError {
    fn from(err: PoNumberError) -> Self {
        Self::new(err.kind(), err.error_code(), err.to_string())
    }
}

/// A parsed PO number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoNumber {
    /// `YYMM-NNNN`.
    Parent {
        /// Two-digit year.
        year: u32,
        /// Month 1..=12.
        month: u32,
        /// Sequence 1..=9999.
        sequence: u32,
    },
    /// `YYMM-NNNN-NN`.
    Child {
        /// Two-digit year.
        year: u32,
        /// Month 1..=12.
        month: u32,
        /// Parent sequence.
        sequence: u32,
        /// Suffix 1..=99.
        suffix: u32,
    },
}

fn digits(s: &str, len: usize) -> Option<u32> {
    if s.len() == len && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

impl PoNumber {
    /// Parses either shape; returns `None` for anything else.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('-');
        let head = parts.next()?;
        let seq = parts.next()?;
        let suffix = parts.next();
        if parts.next().is_some() {
            return None;
        }

        let year = digits(head.get(0..2)?, 2)?;
        let month = digits(head.get(2..)?, 2)?;
        if !(1..=12).contains(&month) {
            return None;
        }
        let sequence = digits(seq, 4)?;
        if sequence == 0 {
            return None;
        }
        match suffix {
            None => Some(Self::Parent {
                year,
                month,
                sequence,
            }),
            Some(raw) => {
                let suffix = digits(raw, 2)?;
                (suffix >= 1).then_some(Self::Child {
                    year,
                    month,
                    sequence,
                    suffix,
                })
            }
        }
    }

    /// True for child numbers.
    #[must_use]
    pub fn is_child(&self) -> bool {
        matches!(self, Self::Child { .. })
    }
}

/// `YYMM` for the month containing `now`, in UTC.
#[must_use]
pub fn month_prefix(now: DateTime<Utc>) -> String {
    format!("{:02}{:02}", now.year().rem_euclid(100), now.month())
}

/// Formats a parent number.
#[must_use]
pub fn format_parent(prefix: &str, sequence: u32) -> String {
    format!("{prefix}-{sequence:04}")
}

/// Formats a child number.
#[must_use]
pub fn format_child(parent_number: &str, suffix: u32) -> String {
    format!("{parent_number}-{suffix:02}")
}

/// Sequence of a parent number under `prefix`, or `None` if `number` is a
/// child or belongs to another month.
#[must_use]
pub fn parent_sequence(prefix: &str, number: &str) -> Option<u32> {
    let rest = number.strip_prefix(prefix)?.strip_prefix('-')?;
    digits(rest, 4).filter(|n| *n > 0)
}

/// Suffix of a child number of `parent_number`.
#[must_use]
pub fn child_suffix(parent_number: &str, number: &str) -> Option<u32> {
    let rest = number.strip_prefix(parent_number)?.strip_prefix('-')?;
    digits(rest, 2).filter(|n| *n > 0)
}

/// Unused parent numbers for `prefix`, smallest first.
pub fn parent_candidates<'a>(
    prefix: &'a str,
    existing: &[String],
) -> impl Iterator<Item = String> + 'a {
    let used: BTreeSet<u32> = existing
        .iter()
        .filter_map(|n| parent_sequence(prefix, n))
        .collect();
    (1..=MAX_PARENT_SEQUENCE)
        .filter(move |n| !used.contains(n))
        .map(move |n| format_parent(prefix, n))
}

/// Child numbers of `parent_number` after the current maximum suffix.
pub fn child_candidates<'a>(
    parent_number: &'a str,
    existing: &[String],
) -> impl Iterator<Item = String> + 'a {
    let max = existing
        .iter()
        .filter_map(|n| child_suffix(parent_number, n))
        .max()
        .unwrap_or(0);
    (max + 1..=MAX_CHILD_SUFFIX).map(move |n| format_child(parent_number, n))
}

/// Smallest unused parent number for `prefix`.
pub fn next_parent_number(prefix: &str, existing: &[String]) -> Result<String, PoNumberError> {
    parent_candidates(prefix, existing)
        .next()
        .ok_or_else(|| PoNumberError::Exhausted(prefix.to_string()))
}

/// Next child number for `parent_number`.
pub fn next_child_number(
    parent_number: &str,
    existing: &[String],
) -> Result<String, PoNumberError> {
    child_candidates(parent_number, existing)
        .next()
        .ok_or_else(|| PoNumberError::Exhausted(parent_number.to_string()))
}
