//! Request middleware.

pub mod auth;
pub mod machine;

pub use auth::{AuthUser, auth_middleware};
pub use machine::{MachineCaller, MachineGuard, require_machine_role};
