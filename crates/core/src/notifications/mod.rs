//! Templated notifications emitted alongside lifecycle transitions.
//!
//! The engine only decides who is told what; rows are written by the store
//! in the same transaction and delivered later by the mailer.

pub mod types;

pub use types::{NotificationData, NotificationIntent, NotificationStatus, TemplateCode};
