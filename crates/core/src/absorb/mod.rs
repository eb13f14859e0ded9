//! Merging duplicate records into one survivor.
//!
//! # Modules
//!
//! - `collection` - Absorbable collections and their reference descriptors
//! - `request` - Request checks and the parent constraint
//! - `error` - Absorb errors

pub mod collection;
pub mod error;
pub mod request;

pub use collection::{AbsorbCollection, Reference, UpdatedReferences};
pub use error::AbsorbError;
pub use request::AbsorbPlan;
