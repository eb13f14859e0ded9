//! Integration tests for the second approver reminder sweep.
//!
//! Require PostgreSQL at `DATABASE_URL`; skipped when it is unreachable.
//! Sweeps are global, so assertions only look at this test's own users.

mod common;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

use backoffice_core::claims::ClaimName;
use backoffice_core::purchase_order::RejectionReason;
use backoffice_db::entities::{notifications, purchase_orders};
use backoffice_db::{NotificationRepository, PurchaseOrderRepository};
use backoffice_shared::types::{PurchaseOrderId, UserId};

use common::{PoFixture, approver, division, purchase_order, setup, user};

struct Chain {
    creator: UserId,
    first: UserId,
    second: UserId,
    division: String,
}

/// A division with a first-tier approver and a second-tier approver. The
/// creator also holds a second-tier grant.
async fn chain(db: &sea_orm::DatabaseConnection) -> Chain {
    let division = division(db).await;
    let creator = user(db, "Casey", "Creator").await;
    let first = user(db, "Avery", "Approver").await;
    let second = user(db, "Morgan", "Manager").await;
    approver(db, &first, ClaimName::PoApprover, &division, dec!(500)).await;
    approver(db, &second, ClaimName::PoApproverTier2, &division, dec!(2500)).await;
    approver(db, &creator, ClaimName::PoApproverTier2, &division, dec!(2500)).await;
    Chain {
        creator,
        first,
        second,
        division,
    }
}

/// An order above the first threshold, first-approved `hours_ago`.
async fn first_approved(
    db: &sea_orm::DatabaseConnection,
    chain: &Chain,
    hours_ago: i64,
) -> purchase_orders::Model {
    let po = purchase_order(
        db,
        PoFixture {
            creator: &chain.creator,
            division: &chain.division,
            po_type: "One-Time",
            status: "Unapproved",
            total: dec!(1200),
            approval_total: dec!(1200),
        },
    )
    .await;
    let approved = PurchaseOrderRepository::new(db.clone())
        .approve(
            &PurchaseOrderId::from_db(po.id.clone()),
            &chain.first,
            Utc::now() - Duration::hours(hours_ago),
        )
        .await
        .unwrap();
    assert_eq!(approved.status, "Unapproved");
    assert!(approved.second_approval.is_none());
    approved
}

fn sent_to<'a>(queued: &'a [notifications::Model], user: &UserId) -> Vec<&'a notifications::Model> {
    queued.iter().filter(|n| n.recipient == user.as_str()).collect()
}

#[tokio::test]
async fn test_lapsed_holdover_reminds_each_second_approver_once() {
    let Some(db) = setup().await else { return };
    let chain = chain(&db).await;
    first_approved(&db, &chain, 25).await;
    first_approved(&db, &chain, 40).await;

    let queued = PurchaseOrderRepository::new(db.clone())
        .queue_second_approver_reminders(Utc::now())
        .await
        .unwrap();

    let mine = sent_to(&queued, &chain.second);
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].actor, None);
    assert!(sent_to(&queued, &chain.creator).is_empty());
    assert!(sent_to(&queued, &chain.first).is_empty());

    let pending = NotificationRepository::new(db.clone())
        .pending_for(&chain.second)
        .await
        .unwrap();
    let (_, template) = pending
        .iter()
        .find(|(n, _)| n.id == mine[0].id)
        .expect("queued reminder");
    assert_eq!(
        template.as_ref().unwrap().code,
        "po_second_approval_required"
    );
}

#[tokio::test]
async fn test_holdover_not_yet_lapsed() {
    let Some(db) = setup().await else { return };
    let chain = chain(&db).await;
    first_approved(&db, &chain, 23).await;

    let queued = PurchaseOrderRepository::new(db.clone())
        .queue_second_approver_reminders(Utc::now())
        .await
        .unwrap();

    assert!(sent_to(&queued, &chain.second).is_empty());
}

#[tokio::test]
async fn test_settled_orders_are_not_reminded() {
    let Some(db) = setup().await else { return };
    let chain = chain(&db).await;
    let repo = PurchaseOrderRepository::new(db.clone());

    let seconded = first_approved(&db, &chain, 30).await;
    let done = repo
        .approve(
            &PurchaseOrderId::from_db(seconded.id.clone()),
            &chain.second,
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(done.status, "Active");
    assert!(done.second_approval.is_some());

    let rejected = first_approved(&db, &chain, 30).await;
    repo.reject(
        &PurchaseOrderId::from_db(rejected.id.clone()),
        &chain.second,
        RejectionReason::parse(Some("wrong vendor")).unwrap(),
        Utc::now(),
    )
    .await
    .unwrap();

    let queued = repo
        .queue_second_approver_reminders(Utc::now())
        .await
        .unwrap();

    assert!(sent_to(&queued, &chain.second).is_empty());
}

#[tokio::test]
async fn test_orders_below_second_threshold_are_ignored() {
    let Some(db) = setup().await else { return };
    let chain = chain(&db).await;
    let po = purchase_order(
        &db,
        PoFixture {
            creator: &chain.creator,
            division: &chain.division,
            po_type: "One-Time",
            status: "Unapproved",
            total: dec!(400),
            approval_total: dec!(400),
        },
    )
    .await;
    let active = PurchaseOrderRepository::new(db.clone())
        .approve(
            &PurchaseOrderId::from_db(po.id.clone()),
            &chain.first,
            Utc::now() - Duration::hours(30),
        )
        .await
        .unwrap();
    assert_eq!(active.status, "Active");

    let queued = PurchaseOrderRepository::new(db.clone())
        .queue_second_approver_reminders(Utc::now())
        .await
        .unwrap();

    assert!(sent_to(&queued, &chain.second).is_empty());
}
