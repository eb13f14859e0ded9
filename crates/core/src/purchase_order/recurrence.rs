//! Recurring purchase order schedules.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::purchase_order::error::PurchaseOrderError;
use crate::purchase_order::types::{Frequency, PoSnapshot, PoType};

/// Longest allowed span between start and end date, in days.
pub const RECURRING_MAX_DAYS: i64 = 400;

/// Fewest occurrences a Recurring purchase order may have.
pub const MIN_OCCURRENCES: i64 = 2;

/// Start, end and frequency of a Recurring purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurringSchedule {
    /// First date.
    pub start: NaiveDate,
    /// Last date.
    pub end: NaiveDate,
    /// Recurrence.
    pub frequency: Frequency,
}

impl RecurringSchedule {
    /// Builds a schedule from a snapshot.
    ///
    /// # Errors
    /// `InvalidSchedule` when the PO is not Recurring or lacks an end date
    /// or frequency.
    pub fn from_snapshot(po: &PoSnapshot) -> Result<Self, PurchaseOrderError> {
        if po.po_type != PoType::Recurring {
            return Err(PurchaseOrderError::InvalidSchedule(
                "purchase order is not recurring".to_string(),
            ));
        }
        let end = po.end_date.ok_or_else(|| {
            PurchaseOrderError::InvalidSchedule(
                "end_date is required for recurring purchase orders".to_string(),
            )
        })?;
        let frequency = po.frequency.ok_or_else(|| {
            PurchaseOrderError::InvalidSchedule(
                "frequency is required for recurring purchase orders".to_string(),
            )
        })?;
        Ok(Self {
            start: po.date,
            end,
            frequency,
        })
    }

    /// Whole days from start to end.
    #[must_use]
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Number of whole periods between start and end.
    ///
    /// # Errors
    /// `InvalidSchedule` when the end is not after the start, the span
    /// exceeds [`RECURRING_MAX_DAYS`], or fewer than two occurrences fit.
    pub fn occurrences(&self) -> Result<u32, PurchaseOrderError> {
        let days = self.span_days();
        if days <= 0 {
            return Err(PurchaseOrderError::InvalidSchedule(
                "end_date must be after start_date".to_string(),
            ));
        }
        if days > RECURRING_MAX_DAYS {
            return Err(PurchaseOrderError::InvalidSchedule(format!(
                "recurring purchase orders may span at most {RECURRING_MAX_DAYS} days"
            )));
        }
        let occurrences = days / self.frequency.period_days();
        if occurrences < MIN_OCCURRENCES {
            return Err(PurchaseOrderError::InvalidSchedule(
                "recurring purchase order must occur at least twice".to_string(),
            ));
        }
        u32::try_from(occurrences)
            .map_err(|_| PurchaseOrderError::InvalidSchedule("too many occurrences".to_string()))
    }

    /// `total × occurrences`.
    pub fn approval_total(&self, total: Decimal) -> Result<Decimal, PurchaseOrderError> {
        Ok(total * Decimal::from(self.occurrences()?))
    }

    /// True once `committed` expenses cover every occurrence.
    pub fn is_exhausted(&self, committed: u64) -> Result<bool, PurchaseOrderError> {
        Ok(committed >= u64::from(self.occurrences()?))
    }
}
