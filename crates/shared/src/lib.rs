//! Shared types, errors, and configuration for the backoffice engine.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error taxonomy
//! - Typed record ids
//! - Session token validation
//! - Configuration management

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::TokenClaims;
pub use config::AppConfig;
pub use error::{AppError, AppResult, ErrorKind};
pub use jwt::{JwtConfig, JwtError, JwtService};
