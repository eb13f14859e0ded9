//! Integration tests for the purchase order lifecycle repository.
//!
//! Require PostgreSQL at `DATABASE_URL`; skipped when it is unreachable.

#![allow(clippy::too_many_lines)]

mod common;

use chrono::Utc;
use futures::future::join_all;
use rust_decimal_macros::dec;

use backoffice_core::claims::ClaimName;
use backoffice_core::purchase_order::RejectionReason;
use backoffice_core::purchase_order::po_number::{PoNumber, month_prefix};
use backoffice_db::entities::purchase_orders;
use backoffice_db::{NotificationRepository, PurchaseOrderRepository};
use backoffice_shared::types::{PurchaseOrderId, UserId};

use common::{
    PoFixture, approver, division, expense, grant, purchase_order, recurring, renumber, setup,
    user,
};

fn po_id(model: &purchase_orders::Model) -> PurchaseOrderId {
    PurchaseOrderId::from_db(model.id.clone())
}

#[tokio::test]
async fn test_first_tier_approval_activates_and_numbers() {
    let Some(db) = setup().await else { return };
    let div = division(&db).await;
    let creator = user(&db, "Casey", "Creator").await;
    let boss = user(&db, "Avery", "Approver").await;
    approver(&db, &boss, ClaimName::PoApprover, &div, dec!(500)).await;

    let po = purchase_order(
        &db,
        PoFixture {
            creator: &creator,
            division: &div,
            po_type: "One-Time",
            status: "Unapproved",
            total: dec!(329.01),
            approval_total: dec!(329.01),
        },
    )
    .await;

    let repo = PurchaseOrderRepository::new(db.clone());
    let now = Utc::now();
    let updated = repo.approve(&po_id(&po), &boss, now).await.unwrap();

    assert_eq!(updated.status, "Active");
    assert_eq!(updated.approver.as_deref(), Some(boss.as_str()));
    assert!(updated.approved.is_some());
    assert!(updated.second_approval.is_none());
    assert!(updated.po_number.starts_with(&format!("{}-", month_prefix(now))));
    assert!(matches!(
        PoNumber::parse(&updated.po_number),
        Some(PoNumber::Parent { .. })
    ));

    let pending = NotificationRepository::new(db.clone())
        .pending_for(&creator)
        .await
        .unwrap();
    let (notification, template) = pending
        .iter()
        .find(|(n, _)| n.data["POId"] == po.id.as_str())
        .expect("po_active notification");
    assert_eq!(template.as_ref().unwrap().code, "po_active");
    assert_eq!(notification.data["PONumber"], updated.po_number.as_str());
    assert_eq!(notification.data["POApproverName"], "Avery Approver");

    let again = repo.approve(&po_id(&po), &boss, Utc::now()).await.unwrap_err();
    assert_eq!(again.error_code(), "po_not_unapproved");
}

#[tokio::test]
async fn test_non_approver_cannot_approve() {
    let Some(db) = setup().await else { return };
    let div = division(&db).await;
    let creator = user(&db, "Casey", "Creator").await;
    let stranger = user(&db, "Sam", "Stranger").await;
    let po = purchase_order(
        &db,
        PoFixture {
            creator: &creator,
            division: &div,
            po_type: "One-Time",
            status: "Unapproved",
            total: dec!(100),
            approval_total: dec!(100),
        },
    )
    .await;

    let err = PurchaseOrderRepository::new(db.clone())
        .approve(&po_id(&po), &stranger, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "unauthorized_approval");
    assert_eq!(err.status_code(), 403);
}

#[tokio::test]
async fn test_unassignable_second_approval_rolls_back() {
    let Some(db) = setup().await else { return };
    let div = division(&db).await;
    let creator = user(&db, "Casey", "Creator").await;
    let boss = user(&db, "Avery", "Approver").await;
    approver(&db, &boss, ClaimName::PoApprover, &div, dec!(5000)).await;

    let po = purchase_order(
        &db,
        PoFixture {
            creator: &creator,
            division: &div,
            po_type: "One-Time",
            status: "Unapproved",
            total: dec!(862.12),
            approval_total: dec!(862.12),
        },
    )
    .await;

    let repo = PurchaseOrderRepository::new(db.clone());
    let err = repo.approve(&po_id(&po), &boss, Utc::now()).await.unwrap_err();
    assert_eq!(err.error_code(), "second_approval_unassignable");

    let stored = repo.find(&po_id(&po)).await.unwrap().unwrap();
    assert!(stored.approved.is_none());
    assert_eq!(stored.status, "Unapproved");
}

#[tokio::test]
async fn test_two_step_approval_above_tier_one() {
    let Some(db) = setup().await else { return };
    let div = division(&db).await;
    let creator = user(&db, "Casey", "Creator").await;
    let first = user(&db, "Avery", "Approver").await;
    let second = user(&db, "Morgan", "Manager").await;
    approver(&db, &first, ClaimName::PoApprover, &div, dec!(500)).await;
    approver(&db, &second, ClaimName::PoApproverTier2, &div, dec!(2500)).await;

    let po = purchase_order(
        &db,
        PoFixture {
            creator: &creator,
            division: &div,
            po_type: "One-Time",
            status: "Unapproved",
            total: dec!(862.12),
            approval_total: dec!(862.12),
        },
    )
    .await;

    let repo = PurchaseOrderRepository::new(db.clone());
    let after_first = repo.approve(&po_id(&po), &first, Utc::now()).await.unwrap();
    assert_eq!(after_first.status, "Unapproved");
    assert_eq!(after_first.po_number, "");
    assert!(after_first.approved.is_some());
    assert!(after_first.second_approval.is_none());

    let err = repo
        .approve(&po_id(&po), &first, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "unauthorized_approval");

    let done = repo.approve(&po_id(&po), &second, Utc::now()).await.unwrap();
    assert_eq!(done.status, "Active");
    assert_eq!(done.approver.as_deref(), Some(first.as_str()));
    assert_eq!(done.second_approver.as_deref(), Some(second.as_str()));
    assert!(!done.po_number.is_empty());
}

#[tokio::test]
async fn test_single_call_completes_both_approvals() {
    let Some(db) = setup().await else { return };
    let div = division(&db).await;
    let creator = user(&db, "Casey", "Creator").await;
    let senior = user(&db, "Jordan", "Senior").await;
    approver(&db, &senior, ClaimName::PoApproverTier2, &div, dec!(2500)).await;

    let po = purchase_order(
        &db,
        PoFixture {
            creator: &creator,
            division: &div,
            po_type: "One-Time",
            status: "Unapproved",
            total: dec!(862.12),
            approval_total: dec!(862.12),
        },
    )
    .await;

    let done = PurchaseOrderRepository::new(db.clone())
        .approve(&po_id(&po), &senior, Utc::now())
        .await
        .unwrap();
    assert_eq!(done.status, "Active");
    assert_eq!(done.approver.as_deref(), Some(senior.as_str()));
    assert_eq!(done.second_approver.as_deref(), Some(senior.as_str()));
}

#[tokio::test]
async fn test_reject_then_approve_is_refused() {
    let Some(db) = setup().await else { return };
    let div = division(&db).await;
    let creator = user(&db, "Casey", "Creator").await;
    let senior = user(&db, "Jordan", "Senior").await;
    approver(&db, &senior, ClaimName::PoApproverTier2, &div, dec!(2500)).await;

    // Below T1: a tier-2 holder may still reject.
    let po = purchase_order(
        &db,
        PoFixture {
            creator: &creator,
            division: &div,
            po_type: "One-Time",
            status: "Unapproved",
            total: dec!(120),
            approval_total: dec!(120),
        },
    )
    .await;

    let repo = PurchaseOrderRepository::new(db.clone());
    let reason = RejectionReason::parse(Some("  Wrong vendor  ")).unwrap();
    let rejected = repo
        .reject(&po_id(&po), &senior, reason, Utc::now())
        .await
        .unwrap();
    assert_eq!(rejected.status, "Unapproved");
    assert_eq!(rejected.rejection_reason, "Wrong vendor");
    assert_eq!(rejected.rejector.as_deref(), Some(senior.as_str()));

    let err = repo.approve(&po_id(&po), &senior, Utc::now()).await.unwrap_err();
    assert_eq!(err.error_code(), "po_rejected");

    let again = RejectionReason::parse(Some("Still wrong")).unwrap();
    let err = repo
        .reject(&po_id(&po), &senior, again, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "po_rejected");
}

#[tokio::test]
async fn test_cancel_requires_admin_and_no_expenses() {
    let Some(db) = setup().await else { return };
    let div = division(&db).await;
    let creator = user(&db, "Casey", "Creator").await;
    let admin = user(&db, "Pat", "Payables").await;
    grant(&db, &admin, ClaimName::PayablesAdmin, None).await;

    let fixture = || PoFixture {
        creator: &creator,
        division: &div,
        po_type: "One-Time",
        status: "Active",
        total: dec!(250),
        approval_total: dec!(250),
    };
    let used = purchase_order(&db, fixture()).await;
    let unused = purchase_order(&db, fixture()).await;
    expense(&db, &creator, &div, Some(&used.id), dec!(10), false).await;

    let repo = PurchaseOrderRepository::new(db.clone());
    let err = repo
        .cancel(&po_id(&unused), &creator, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "unauthorized_cancellation");

    let err = repo
        .cancel(&po_id(&used), &admin, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "po_has_expenses");

    let cancelled = repo.cancel(&po_id(&unused), &admin, Utc::now()).await.unwrap();
    assert_eq!(cancelled.status, "Cancelled");
    assert_eq!(cancelled.canceller.as_deref(), Some(admin.as_str()));

    let err = repo
        .cancel(&po_id(&unused), &admin, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "po_not_active");
}

#[tokio::test]
async fn test_close_and_make_cumulative() {
    let Some(db) = setup().await else { return };
    let div = division(&db).await;
    let creator = user(&db, "Casey", "Creator").await;
    let admin = user(&db, "Pat", "Payables").await;
    grant(&db, &admin, ClaimName::PayablesAdmin, None).await;

    let one_time = purchase_order(
        &db,
        PoFixture {
            creator: &creator,
            division: &div,
            po_type: "One-Time",
            status: "Active",
            total: dec!(400),
            approval_total: dec!(400),
        },
    )
    .await;

    let repo = PurchaseOrderRepository::new(db.clone());
    let err = repo
        .close(&po_id(&one_time), &admin, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "invalid_po_type");
    assert_eq!(
        err.message(),
        "One-Time purchase orders may be cancelled but not manually closed"
    );

    let err = repo
        .make_cumulative(&po_id(&one_time), &creator)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "unauthorized_conversion");

    let converted = repo.make_cumulative(&po_id(&one_time), &admin).await.unwrap();
    assert_eq!(converted.po_type, "Cumulative");

    let err = repo
        .make_cumulative(&po_id(&one_time), &admin)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "po_not_one_time");

    let closed = repo.close(&po_id(&one_time), &admin, Utc::now()).await.unwrap();
    assert_eq!(closed.status, "Closed");
    assert_eq!(closed.closer.as_deref(), Some(admin.as_str()));
    assert!(!closed.closed_by_system);
}

#[tokio::test]
async fn test_unknown_purchase_order() {
    let Some(db) = setup().await else { return };
    let caller = user(&db, "Casey", "Creator").await;
    let err = PurchaseOrderRepository::new(db.clone())
        .approve(
            &PurchaseOrderId::from_db("zzzzzzzzzzzzzzz".to_string()),
            &caller,
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "po_not_found");
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn test_concurrent_activations_get_distinct_numbers() {
    let Some(db) = setup().await else { return };
    let div = division(&db).await;
    let creator = user(&db, "Casey", "Creator").await;
    let boss = user(&db, "Avery", "Approver").await;
    approver(&db, &boss, ClaimName::PoApprover, &div, dec!(500)).await;

    let mut ids = Vec::new();
    for _ in 0..8 {
        let po = purchase_order(
            &db,
            PoFixture {
                creator: &creator,
                division: &div,
                po_type: "One-Time",
                status: "Unapproved",
                total: dec!(50),
                approval_total: dec!(50),
            },
        )
        .await;
        ids.push(po_id(&po));
    }

    let repo = PurchaseOrderRepository::new(db.clone());
    let now = Utc::now();
    let results = join_all(ids.iter().map(|id| repo.approve(id, &boss, now))).await;

    let failures: Vec<&str> = results
        .iter()
        .filter_map(|r| r.as_ref().err().map(|e| e.error_code()))
        .collect();
    assert!(failures.is_empty(), "concurrent approvals failed: {failures:?}");

    let mut numbers: Vec<String> = results
        .into_iter()
        .flatten()
        .map(|po| po.po_number)
        .collect();
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), ids.len());
    assert!(numbers.iter().all(|n| n.starts_with(&format!("{}-", month_prefix(now)))));
}

/// An order of `po_type` and `status` in `division`, small enough for one
/// first-tier approval.
async fn small_order(
    db: &sea_orm::DatabaseConnection,
    creator: &UserId,
    division: &str,
    status: &str,
) -> purchase_orders::Model {
    purchase_order(
        db,
        PoFixture {
            creator,
            division,
            po_type: "One-Time",
            status,
            total: dec!(100),
            approval_total: dec!(100),
        },
    )
    .await
}

#[tokio::test]
async fn test_recurring_child_numbered_after_highest_sibling() {
    let Some(db) = setup().await else { return };
    let div = division(&db).await;
    let creator = user(&db, "Casey", "Creator").await;
    let boss = user(&db, "Avery", "Approver").await;
    approver(&db, &boss, ClaimName::PoApprover, &div, dec!(500)).await;

    let parent = small_order(&db, &creator, &div, "Active").await;
    let parent = recurring(&db, parent, None).await;
    let sibling = small_order(&db, &creator, &div, "Active").await;
    let sibling = recurring(&db, sibling, Some(&parent.id)).await;
    renumber(&db, sibling, &format!("{}-03", parent.po_number)).await;

    let child = small_order(&db, &creator, &div, "Unapproved").await;
    let child = recurring(&db, child, Some(&parent.id)).await;

    let done = PurchaseOrderRepository::new(db.clone())
        .approve(&po_id(&child), &boss, Utc::now())
        .await
        .unwrap();
    assert_eq!(done.status, "Active");
    assert_eq!(done.po_number, format!("{}-04", parent.po_number));
}

#[tokio::test]
async fn test_child_of_unnumbered_parent_is_refused() {
    let Some(db) = setup().await else { return };
    let div = division(&db).await;
    let creator = user(&db, "Casey", "Creator").await;
    let boss = user(&db, "Avery", "Approver").await;
    approver(&db, &boss, ClaimName::PoApprover, &div, dec!(500)).await;

    let parent = small_order(&db, &creator, &div, "Unapproved").await;
    let parent = recurring(&db, parent, None).await;
    let child = small_order(&db, &creator, &div, "Unapproved").await;
    let child = recurring(&db, child, Some(&parent.id)).await;

    let repo = PurchaseOrderRepository::new(db.clone());
    let err = repo
        .approve(&po_id(&child), &boss, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "parent_po_missing_number");
    assert_eq!(err.status_code(), 400);

    let stored = repo.find(&po_id(&child)).await.unwrap().unwrap();
    assert_eq!(stored.status, "Unapproved");
    assert!(stored.approved.is_none());
    assert_eq!(stored.po_number, "");
}

#[tokio::test]
async fn test_child_suffixes_exhausted() {
    let Some(db) = setup().await else { return };
    let div = division(&db).await;
    let creator = user(&db, "Casey", "Creator").await;
    let boss = user(&db, "Avery", "Approver").await;
    approver(&db, &boss, ClaimName::PoApprover, &div, dec!(500)).await;

    let parent = small_order(&db, &creator, &div, "Active").await;
    let parent = recurring(&db, parent, None).await;
    let last = small_order(&db, &creator, &div, "Active").await;
    let last = recurring(&db, last, Some(&parent.id)).await;
    renumber(&db, last, &format!("{}-99", parent.po_number)).await;

    let child = small_order(&db, &creator, &div, "Unapproved").await;
    let child = recurring(&db, child, Some(&parent.id)).await;

    let err = PurchaseOrderRepository::new(db.clone())
        .approve(&po_id(&child), &boss, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "po_number_exhausted");
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn test_child_of_one_time_parent_is_refused() {
    let Some(db) = setup().await else { return };
    let div = division(&db).await;
    let creator = user(&db, "Casey", "Creator").await;
    let boss = user(&db, "Avery", "Approver").await;
    approver(&db, &boss, ClaimName::PoApprover, &div, dec!(500)).await;

    let parent = small_order(&db, &creator, &div, "Active").await;
    let child = small_order(&db, &creator, &div, "Unapproved").await;
    let child = recurring(&db, child, Some(&parent.id)).await;

    let repo = PurchaseOrderRepository::new(db.clone());
    let err = repo
        .approve(&po_id(&child), &boss, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "parent_po_not_recurring");
    assert_eq!(err.status_code(), 400);

    let stored = repo.find(&po_id(&child)).await.unwrap().unwrap();
    assert_eq!(stored.status, "Unapproved");
    assert_eq!(stored.po_number, "");
}
