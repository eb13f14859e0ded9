//! Purchase order domain types.

use backoffice_shared::types::{PurchaseOrderId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a purchase order.
///
/// Valid transitions:
/// - Unapproved → Active (final approval)
/// - Active → Closed (manual close or reconciler)
/// - Active → Cancelled (cancel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoStatus {
    /// Awaiting approval.
    Unapproved,
    /// Approved and numbered; expenses may be charged against it.
    Active,
    /// Fully spent or manually closed (terminal).
    Closed,
    /// Withdrawn before use (terminal).
    Cancelled,
}

impl PoStatus {
    /// Returns the stored value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unapproved => "Unapproved",
            Self::Active => "Active",
            Self::Closed => "Closed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Parses a stored value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Unapproved" => Some(Self::Unapproved),
            "Active" => Some(Self::Active),
            "Closed" => Some(Self::Closed),
            "Cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true for Closed and Cancelled.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Cancelled)
    }
}

impl fmt::Display for PoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a purchase order is consumed by expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoType {
    /// A single expense closes it.
    #[serde(rename = "One-Time", alias = "Normal")]
    OneTime,
    /// Many expenses up to the total plus an allowed excess.
    Cumulative,
    /// One expense per scheduled occurrence.
    Recurring,
}

impl PoType {
    /// Returns the stored value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneTime => "One-Time",
            Self::Cumulative => "Cumulative",
            Self::Recurring => "Recurring",
        }
    }

    /// Parses a stored value; the legacy name `Normal` reads as One-Time.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "One-Time" | "Normal" => Some(Self::OneTime),
            "Cumulative" => Some(Self::Cumulative),
            "Recurring" => Some(Self::Recurring),
            _ => None,
        }
    }
}

impl fmt::Display for PoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recurrence of a Recurring purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    /// Every 7 days.
    Weekly,
    /// Every 14 days.
    Biweekly,
    /// Every 30 days.
    Monthly,
}

impl Frequency {
    /// Returns the stored value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "Weekly",
            Self::Biweekly => "Biweekly",
            Self::Monthly => "Monthly",
        }
    }

    /// Parses a stored value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Weekly" => Some(Self::Weekly),
            "Biweekly" => Some(Self::Biweekly),
            "Monthly" => Some(Self::Monthly),
            _ => None,
        }
    }

    /// Days per occurrence.
    #[must_use]
    pub fn period_days(&self) -> i64 {
        match self {
            Self::Weekly => 7,
            Self::Biweekly => 14,
            Self::Monthly => 30,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The lifecycle-relevant state of a purchase order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoSnapshot {
    /// Record id.
    pub id: PurchaseOrderId,
    /// Creator.
    pub uid: UserId,
    /// Current status.
    pub status: PoStatus,
    /// Consumption type.
    pub po_type: PoType,
    /// Per-occurrence value.
    pub total: Decimal,
    /// Value authorization is measured against.
    pub approval_total: Decimal,
    /// Start date.
    pub date: NaiveDate,
    /// Last date of a Recurring schedule.
    pub end_date: Option<NaiveDate>,
    /// Recurrence of a Recurring schedule.
    pub frequency: Option<Frequency>,
    /// First approval time.
    pub approved: Option<DateTime<Utc>>,
    /// Second approval time.
    pub second_approval: Option<DateTime<Utc>>,
    /// Rejection time.
    pub rejected: Option<DateTime<Utc>>,
    /// Designated second approver, if any.
    pub priority_second_approver: Option<UserId>,
    /// Parent purchase order of a Recurring child.
    pub parent_po: Option<PurchaseOrderId>,
}
