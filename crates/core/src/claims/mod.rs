//! Named capabilities held by users.
//!
//! A user claim links a user to a [`ClaimName`] and an optional payload.
//! Purchase-order approver claims carry a typed [`PoApproverPayload`]; the
//! payloads of other claims are kept as raw JSON.

pub mod payload;
pub mod types;

pub use payload::{ClaimPayload, PayloadError, PoApproverPayload};
pub use types::{ClaimGrant, ClaimName};
