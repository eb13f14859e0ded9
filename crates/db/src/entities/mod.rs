//! `SeaORM` entities, one module per table.

pub mod prelude;

pub mod absorb_actions;
pub mod app_config;
pub mod claims;
pub mod client_contacts;
pub mod client_notes;
pub mod clients;
pub mod divisions;
pub mod expenditure_kinds;
pub mod expense_rates;
pub mod expenses;
pub mod jobs;
pub mod machine_secrets;
pub mod mileage_reset_dates;
pub mod notification_templates;
pub mod notifications;
pub mod po_approval_thresholds;
pub mod purchase_orders;
pub mod user_claims;
pub mod users;
