//! Purchase order lifecycle.
//!
//! # Modules
//!
//! - `types` - Status, type, frequency and the lifecycle snapshot
//! - `error` - Lifecycle errors
//! - `holdover` - Priority second-approver holdover and its reminder sweep
//! - `lifecycle` - Approve, reject, cancel, close and convert
//! - `po_number` - PO number format and allocation
//! - `recurrence` - Recurring schedule arithmetic

pub mod error;
pub mod holdover;
pub mod lifecycle;
pub mod po_number;
pub mod recurrence;
pub mod types;

#[cfg(test)]
mod po_number_props;

pub use error::PurchaseOrderError;
pub use holdover::SecondApprovalHoldover;
pub use lifecycle::{
    ApprovalAuthority, ApprovalPlan, LifecycleAction, PurchaseOrderLifecycle, RejectionReason,
};
pub use po_number::{PoNumber, PoNumberError};
pub use recurrence::RecurringSchedule;
pub use types::{Frequency, PoSnapshot, PoStatus, PoType};
