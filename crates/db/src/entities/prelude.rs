//! Entity re-exports.

pub use super::absorb_actions::Entity as AbsorbActions;
pub use super::app_config::Entity as AppConfig;
pub use super::claims::Entity as Claims;
pub use super::client_contacts::Entity as ClientContacts;
pub use super::client_notes::Entity as ClientNotes;
pub use super::clients::Entity as Clients;
pub use super::divisions::Entity as Divisions;
pub use super::expenditure_kinds::Entity as ExpenditureKinds;
pub use super::expense_rates::Entity as ExpenseRates;
pub use super::expenses::Entity as Expenses;
pub use super::jobs::Entity as Jobs;
pub use super::machine_secrets::Entity as MachineSecrets;
pub use super::mileage_reset_dates::Entity as MileageResetDates;
pub use super::notification_templates::Entity as NotificationTemplates;
pub use super::notifications::Entity as Notifications;
pub use super::po_approval_thresholds::Entity as PoApprovalThresholds;
pub use super::purchase_orders::Entity as PurchaseOrders;
pub use super::user_claims::Entity as UserClaims;
pub use super::users::Entity as Users;
