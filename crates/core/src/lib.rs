//! Core business logic for the purchase order engine.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Store lookups are done by the caller and handed in as plain values; every
//! decision about what to write comes back as a value to persist.
//!
//! # Modules
//!
//! - `claims` - User claims and typed approver payloads
//! - `approvers` - Approval thresholds and candidate selection
//! - `purchase_order` - Lifecycle state machine, PO numbers, recurrence
//! - `reconcile` - Expense commit and purchase order reconciliation
//! - `notifications` - Notification templates and envelopes
//! - `absorb` - Record absorption descriptors and checks
//! - `config_gate` - Fail-open feature flags
//! - `machine_token` - Machine secret minting and verification

pub mod absorb;
pub mod approvers;
pub mod claims;
pub mod config_gate;
pub mod machine_token;
pub mod notifications;
pub mod purchase_order;
pub mod reconcile;
