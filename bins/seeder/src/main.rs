//! Loads the canonical fixture set.
//!
//! Seeds one division, a requester, a first-tier and a second-tier approver,
//! the approval thresholds, two unapproved purchase orders and three clients
//! for the absorb walkthrough. Rows that already exist are left alone, so the
//! seeder can be re-run.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde_json::json;

use backoffice_core::claims::ClaimName;
use backoffice_db::ClaimRepository;
use backoffice_db::entities::{
    clients, divisions, jobs, po_approval_thresholds, purchase_orders, users,
};
use backoffice_shared::types::UserId;

const DIVISION_ID: &str = "vccd5fo56ctbigh";
const REQUESTER_ID: &str = "rzr98oadsp9qc11";
const APPROVER_ID: &str = "f2j5a8vk006baub";
const SECOND_APPROVER_ID: &str = "wegviunlyr2jjjv";

/// Below the first threshold: one approval activates it.
const SMALL_PO_ID: &str = "gal6e5la2fa4rpn";
/// Above the first threshold: needs a second approval.
const LARGE_PO_ID: &str = "2plj8ijmbq6hbrk";

const TARGET_CLIENT_ID: &str = "lb0fnenkeyitsny";
const DUPLICATE_CLIENT_IDS: [&str; 2] = ["eldtxi3i4h00k8r", "pqpd90fqd5ohjcs"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    println!("Connecting to database...");
    let db = backoffice_db::connect_url(&database_url).await?;

    println!("Seeding approval thresholds...");
    seed_thresholds(&db).await?;

    println!("Seeding division and users...");
    seed_division(&db).await?;
    seed_users(&db).await?;

    println!("Granting claims...");
    seed_claims(&db).await?;

    println!("Seeding purchase orders...");
    seed_purchase_order(&db, SMALL_PO_ID, dec!(329.01)).await?;
    seed_purchase_order(&db, LARGE_PO_ID, dec!(862.12)).await?;

    println!("Seeding clients and jobs...");
    seed_clients(&db).await?;

    println!("Seeding complete!");
    Ok(())
}

async fn seed_thresholds(db: &DatabaseConnection) -> anyhow::Result<()> {
    for (tier, ceiling) in [(1, dec!(500.00)), (2, dec!(2500.00))] {
        if po_approval_thresholds::Entity::find_by_id(tier).one(db).await?.is_some() {
            println!("  Tier {tier} already configured, skipping...");
            continue;
        }
        po_approval_thresholds::ActiveModel {
            tier: Set(tier),
            ceiling: Set(ceiling),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

async fn seed_division(db: &DatabaseConnection) -> anyhow::Result<()> {
    if divisions::Entity::find_by_id(DIVISION_ID).one(db).await?.is_some() {
        println!("  Division already exists, skipping...");
        return Ok(());
    }
    divisions::ActiveModel {
        id: Set(DIVISION_ID.to_string()),
        code: Set("CORP".to_string()),
        name: Set("Corporate".to_string()),
        active: Set(true),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn seed_users(db: &DatabaseConnection) -> anyhow::Result<()> {
    let now = Utc::now();
    for (id, given_name, surname) in [
        (REQUESTER_ID, "Riley", "Requester"),
        (APPROVER_ID, "Avery", "Approver"),
        (SECOND_APPROVER_ID, "Sasha", "Signoff"),
    ] {
        if users::Entity::find_by_id(id).one(db).await?.is_some() {
            println!("  User {id} already exists, skipping...");
            continue;
        }
        users::ActiveModel {
            id: Set(id.to_string()),
            email: Set(format!("{}@example.com", given_name.to_lowercase())),
            given_name: Set(given_name.to_string()),
            surname: Set(surname.to_string()),
            active: Set(true),
            created: Set(now.into()),
            updated: Set(now.into()),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

async fn seed_claims(db: &DatabaseConnection) -> anyhow::Result<()> {
    let claims = ClaimRepository::new(db.clone());
    let approver = UserId::from_db(APPROVER_ID.to_string());
    let second = UserId::from_db(SECOND_APPROVER_ID.to_string());
    let requester = UserId::from_db(REQUESTER_ID.to_string());

    claims
        .grant(
            &approver,
            ClaimName::PoApprover,
            Some(json!({ "max_amount": 500, "divisions": [DIVISION_ID] })),
        )
        .await?;
    claims
        .grant(
            &second,
            ClaimName::PoApproverTier2,
            Some(json!({ "max_amount": 2500, "divisions": [DIVISION_ID] })),
        )
        .await?;
    for claim in [ClaimName::PayablesAdmin, ClaimName::Absorb, ClaimName::Admin] {
        claims.grant(&approver, claim, None).await?;
    }
    claims.grant(&requester, ClaimName::Commit, None).await?;
    Ok(())
}

async fn seed_purchase_order(
    db: &DatabaseConnection,
    id: &str,
    total: Decimal,
) -> anyhow::Result<()> {
    if purchase_orders::Entity::find_by_id(id).one(db).await?.is_some() {
        println!("  Purchase order {id} already exists, skipping...");
        return Ok(());
    }
    let now = Utc::now();
    purchase_orders::ActiveModel {
        id: Set(id.to_string()),
        po_number: Set(String::new()),
        uid: Set(REQUESTER_ID.to_string()),
        date: Set(now.date_naive()),
        end_date: Set(None),
        frequency: Set(None),
        division: Set(DIVISION_ID.to_string()),
        kind: Set("capital".to_string()),
        job: Set(None),
        branch: Set(String::new()),
        vendor: Set("Northwind Supply".to_string()),
        category: Set(String::new()),
        description: Set("Survey equipment".to_string()),
        po_type: Set("One-Time".to_string()),
        status: Set("Unapproved".to_string()),
        total: Set(total),
        approval_total: Set(total),
        approver: Set(None),
        approved: Set(None),
        second_approver: Set(None),
        second_approval: Set(None),
        priority_second_approver: Set(None),
        rejector: Set(None),
        rejected: Set(None),
        rejection_reason: Set(String::new()),
        canceller: Set(None),
        cancelled: Set(None),
        closer: Set(None),
        closed: Set(None),
        closed_by_system: Set(false),
        parent_po: Set(None),
        attachment: Set(String::new()),
        attachment_hash: Set(String::new()),
        created: Set(now.into()),
        updated: Set(now.into()),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn seed_clients(db: &DatabaseConnection) -> anyhow::Result<()> {
    let now = Utc::now();
    let names = [
        (TARGET_CLIENT_ID, "Harbour Engineering"),
        (DUPLICATE_CLIENT_IDS[0], "Harbour Engineering Ltd"),
        (DUPLICATE_CLIENT_IDS[1], "Harbor Engineering"),
    ];
    for (id, name) in names {
        if clients::Entity::find_by_id(id).one(db).await?.is_some() {
            println!("  Client {id} already exists, skipping...");
            continue;
        }
        clients::ActiveModel {
            id: Set(id.to_string()),
            name: Set(name.to_string()),
            business_development_lead: Set(None),
            created: Set(now.into()),
            updated: Set(now.into()),
        }
        .insert(db)
        .await?;
    }

    let job_rows = [
        ("jobharbour00001", "26-001", TARGET_CLIENT_ID),
        ("jobharbour00002", "26-002", DUPLICATE_CLIENT_IDS[0]),
        ("jobharbour00003", "26-003", DUPLICATE_CLIENT_IDS[1]),
    ];
    for (id, number, client) in job_rows {
        if jobs::Entity::find_by_id(id).one(db).await?.is_some() {
            continue;
        }
        jobs::ActiveModel {
            id: Set(id.to_string()),
            number: Set(number.to_string()),
            description: Set(format!("Site survey {number}")),
            client: Set(client.to_string()),
            contact: Set(None),
            created: Set(now.into()),
            updated: Set(now.into()),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}
