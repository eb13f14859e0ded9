//! Priority second-approver holdover.
//!
//! After the first approval of a purchase order that needs a second one, the
//! priority second approver gets a head start. Once the holdover lapses a
//! daily sweep asks every eligible second approver to act instead.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::approvers::ApprovalThresholds;
use crate::notifications::{NotificationIntent, TemplateCode};
use backoffice_shared::types::UserId;

use super::types::{PoSnapshot, PoStatus};

/// `app_config` domain holding purchase order settings.
pub const PURCHASE_ORDERS_DOMAIN: &str = "purchase_orders";

/// Key of the holdover length, in whole hours.
pub const SECOND_STAGE_TIMEOUT_KEY: &str = "second_stage_timeout_hours";

/// Holdover length when none is configured.
pub const DEFAULT_SECOND_STAGE_TIMEOUT_HOURS: i64 = 24;

/// How long the priority second approver is left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondApprovalHoldover {
    timeout: Duration,
}

impl Default for SecondApprovalHoldover {
    fn default() -> Self {
        Self::hours(DEFAULT_SECOND_STAGE_TIMEOUT_HOURS)
    }
}

impl SecondApprovalHoldover {
    /// A holdover of `hours`.
    #[must_use]
    pub fn hours(hours: i64) -> Self {
        Self {
            timeout: Duration::hours(hours),
        }
    }

    /// Reads the holdover from the `purchase_orders` bag. Anything but a
    /// positive whole number of hours falls back to the default.
    #[must_use]
    pub fn from_config(bag: Option<&Value>) -> Self {
        bag.and_then(|b| b.get(SECOND_STAGE_TIMEOUT_KEY))
            .and_then(Value::as_i64)
            .filter(|h| *h > 0)
            .map_or_else(Self::default, Self::hours)
    }

    /// Configured length.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// First approvals at or after this instant are still held over.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.timeout
    }

    /// True once `po` waits on a second approval past the holdover.
    #[must_use]
    pub fn is_lapsed(
        &self,
        po: &PoSnapshot,
        thresholds: &ApprovalThresholds,
        now: DateTime<Utc>,
    ) -> bool {
        po.status == PoStatus::Unapproved
            && po.rejected.is_none()
            && po.second_approval.is_none()
            && po.approved.is_some_and(|at| at < self.cutoff(now))
            && thresholds.requires_second_approval(po.approval_total)
    }

    /// One reminder per recipient, however many purchase orders qualify them.
    #[must_use]
    pub fn reminders<I>(recipients: I) -> Vec<NotificationIntent>
    where
        I: IntoIterator<Item = UserId>,
    {
        let mut unique: Vec<UserId> = recipients.into_iter().collect();
        unique.sort();
        unique.dedup();
        unique
            .into_iter()
            .map(|u| NotificationIntent::required(u, TemplateCode::PoSecondApprovalRequired))
            .collect()
    }
}
