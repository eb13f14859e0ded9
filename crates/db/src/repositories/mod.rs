//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Lifecycle operations run inside one serializable transaction each; the
//! crate-private helpers take any connection so they compose inside it.

pub mod absorb;
pub mod approvers;
pub mod claims;
pub mod config;
pub mod expense;
pub mod machine_secret;
pub mod notification;
mod po_number;
pub mod purchase_order;
pub mod user;

pub use absorb::AbsorbRepository;
pub use approvers::ApproverRepository;
pub use claims::ClaimRepository;
pub use config::ConfigRepository;
pub use expense::{COMMIT_MESSAGE, ExpenseRepository};
pub use machine_secret::{CreatedSecret, MachineSecretRepository, SecretSummary};
pub use notification::NotificationRepository;
pub use purchase_order::PurchaseOrderRepository;
pub use user::UserRepository;
