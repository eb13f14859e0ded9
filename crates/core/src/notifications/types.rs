//! Notification envelopes.

use backoffice_shared::types::{PurchaseOrderId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Template codes the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateCode {
    /// First approval done; the priority second approver is asked to act.
    PoPrioritySecondApprovalRequired,
    /// The priority holdover lapsed; every eligible second approver is asked to act.
    PoSecondApprovalRequired,
    /// Purchase order became Active.
    PoActive,
    /// Purchase order was rejected.
    PoRejected,
    /// Timesheet was rejected.
    TimesheetRejected,
    /// Expense was rejected.
    ExpenseRejected,
}

impl TemplateCode {
    /// All codes, in seeding order.
    pub const ALL: [Self; 6] = [
        Self::PoPrioritySecondApprovalRequired,
        Self::PoSecondApprovalRequired,
        Self::PoActive,
        Self::PoRejected,
        Self::TimesheetRejected,
        Self::ExpenseRejected,
    ];

    /// Stored template code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PoPrioritySecondApprovalRequired => "po_priority_second_approval_required",
            Self::PoSecondApprovalRequired => "po_second_approval_required",
            Self::PoActive => "po_active",
            Self::PoRejected => "po_rejected",
            Self::TimesheetRejected => "timesheet_rejected",
            Self::ExpenseRejected => "expense_rejected",
        }
    }
}

impl fmt::Display for TemplateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery state, advanced by the mailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    /// Waiting for the mailer.
    Pending,
    /// Picked up by the mailer.
    Inflight,
    /// Delivered.
    Sent,
    /// Delivery failed.
    Failed,
}

impl NotificationStatus {
    /// Stored value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Inflight => "inflight",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

/// Template data for purchase order notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    /// Purchase order id.
    #[serde(rename = "POId", skip_serializing_if = "Option::is_none")]
    pub po_id: Option<String>,
    /// Purchase order number, empty before activation.
    #[serde(rename = "PONumber", skip_serializing_if = "Option::is_none")]
    pub po_number: Option<String>,
    /// Creator's display name.
    #[serde(rename = "POCreatorName", skip_serializing_if = "Option::is_none")]
    pub po_creator_name: Option<String>,
    /// Acting approver's display name.
    #[serde(rename = "POApproverName", skip_serializing_if = "Option::is_none")]
    pub po_approver_name: Option<String>,
    /// Rejection reason, when relevant.
    #[serde(rename = "RejectionReason", skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl NotificationData {
    /// Data for a purchase order event.
    #[must_use]
    pub fn purchase_order(
        po_id: &PurchaseOrderId,
        po_number: &str,
        creator_name: &str,
        approver_name: &str,
    ) -> Self {
        Self {
            po_id: Some(po_id.to_string()),
            po_number: Some(po_number.to_string()),
            po_creator_name: Some(creator_name.to_string()),
            po_approver_name: Some(approver_name.to_string()),
            rejection_reason: None,
        }
    }

    /// Adds a rejection reason.
    #[must_use]
    pub fn with_rejection_reason(mut self, reason: &str) -> Self {
        self.rejection_reason = Some(reason.to_string());
        self
    }
}

/// A notification the caller owes after a lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationIntent {
    /// Recipient user.
    pub recipient: UserId,
    /// Template.
    pub template: TemplateCode,
    /// A missing template fails the transaction when set; otherwise it is
    /// logged and skipped.
    pub required: bool,
}

impl NotificationIntent {
    /// An emission whose failure aborts the transition.
    #[must_use]
    pub fn required(recipient: UserId, template: TemplateCode) -> Self {
        Self {
            recipient,
            template,
            required: true,
        }
    }

    /// An emission whose failure is only logged.
    #[must_use]
    pub fn best_effort(recipient: UserId, template: TemplateCode) -> Self {
        Self {
            recipient,
            template,
            required: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_codes() {
        assert_eq!(
            TemplateCode::PoPrioritySecondApprovalRequired.as_str(),
            "po_priority_second_approval_required"
        );
        assert_eq!(
            TemplateCode::PoSecondApprovalRequired.as_str(),
            "po_second_approval_required"
        );
        for code in TemplateCode::ALL {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, json!(code.as_str()));
        }
    }

    #[test]
    fn test_data_uses_template_keys() {
        let data = NotificationData::purchase_order(
            &PurchaseOrderId::from_db("gal6e5la2fa4rpn".into()),
            "2603-0001",
            "Dana Creator",
            "Ari Approver",
        );
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(
            value,
            json!({
                "POId": "gal6e5la2fa4rpn",
                "PONumber": "2603-0001",
                "POCreatorName": "Dana Creator",
                "POApproverName": "Ari Approver",
            })
        );

        let value =
            serde_json::to_value(data.with_rejection_reason("wrong vendor")).unwrap();
        assert_eq!(value["RejectionReason"], "wrong vendor");
    }

    #[test]
    fn test_status_values() {
        assert_eq!(NotificationStatus::Inflight.as_str(), "inflight");
        assert_eq!(
            serde_json::to_value(NotificationStatus::Pending).unwrap(),
            json!("pending")
        );
    }
}
