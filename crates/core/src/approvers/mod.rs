//! Purchase order approver resolution.
//!
//! # Modules
//!
//! - `kind` - Expenditure kinds and their payload ceiling keys
//! - `error` - Resolution errors
//! - `policy` - Thresholds, candidate selection and second-approver metadata

pub mod error;
pub mod kind;
pub mod policy;

#[cfg(test)]
mod policy_props;

pub use error::ApproverError;
pub use kind::{ExpenditureKind, LimitKey};
pub use policy::{
    ApprovalThresholds, Approver, ApproverQuery, ApproverResolver, ApproverSelection,
    ApproverTier, CandidateRecord, SecondApproverMeta, SecondApproverStatus, SecondTierMode,
};
