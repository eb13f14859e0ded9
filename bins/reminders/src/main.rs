//! Second approver reminder sweep.
//!
//! Queues one `po_second_approval_required` notification per eligible second
//! approver of every purchase order whose priority holdover has lapsed.
//! Meant to run once a day; the deployment schedules it at 21:00 UTC
//! (`0 21 * * *`).
//!
//! Usage: cargo run --bin reminders

use chrono::Utc;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use backoffice_db::{PurchaseOrderRepository, connect};
use backoffice_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "backoffice=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.log.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let db = connect(&config.database).await?;
    let queued = PurchaseOrderRepository::new(db)
        .queue_second_approver_reminders(Utc::now())
        .await?;

    info!(reminders = queued.len(), "reminder sweep finished");
    Ok(())
}
