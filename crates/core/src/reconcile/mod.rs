//! Expense commit and purchase order reconciliation.
//!
//! # Modules
//!
//! - `error` - Commit and reconciliation errors
//! - `excess` - Allowed excess over Cumulative totals
//! - `mileage` - Banded mileage pricing
//! - `service` - Commit checks, week ending and the reconciler

pub mod error;
pub mod excess;
pub mod mileage;
pub mod service;

#[cfg(test)]
mod service_props;

pub use error::ReconcileError;
pub use excess::{ExcessLimit, ExcessMode, ExcessPolicy};
pub use mileage::{MileageRates, whole_distance};
pub use service::{
    CommitStamp, CommittedExpenses, ExpenseCommit, ExpenseSnapshot, PoReconciler,
    ReconcileOutcome, week_ending,
};
