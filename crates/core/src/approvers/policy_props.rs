//! Property-based tests for approver selection.

use backoffice_shared::types::UserId;
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::approvers::kind::ExpenditureKind;
use crate::approvers::policy::{
    ApprovalThresholds, ApproverQuery, ApproverResolver, ApproverTier, CandidateRecord,
    SecondTierMode,
};
use crate::claims::{ClaimName, PoApproverPayload};

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_claim() -> impl Strategy<Value = ClaimName> {
    prop_oneof![
        Just(ClaimName::PoApprover),
        Just(ClaimName::PoApproverTier2),
        Just(ClaimName::PoApproverTier3),
    ]
}

fn arb_tier() -> impl Strategy<Value = ApproverTier> {
    prop_oneof![
        Just(ApproverTier::First),
        Just(ApproverTier::Second(SecondTierMode::Strict)),
        Just(ApproverTier::Second(SecondTierMode::Relaxed)),
    ]
}

fn arb_records() -> impl Strategy<Value = Vec<CandidateRecord>> {
    prop::collection::vec((arb_claim(), arb_amount(), any::<bool>()), 0..12).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (claim, max, scoped))| CandidateRecord {
                user_id: UserId::from_db(format!("user{i:011}")),
                given_name: FirstName().fake(),
                surname: LastName().fake(),
                claim,
                payload: PoApproverPayload {
                    max_amount: Some(max),
                    divisions: if scoped {
                        vec!["fy4i9poneukvq9u".to_string()]
                    } else {
                        vec![]
                    },
                    ..PoApproverPayload::default()
                },
            })
            .collect()
    })
}

fn thresholds() -> ApprovalThresholds {
    ApprovalThresholds::new(vec![Decimal::new(500, 0), Decimal::new(2500, 0)]).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Candidates are sorted by surname, then given name.
    #[test]
    fn prop_candidates_sorted(records in arb_records(), amount in arb_amount(), tier in arb_tier()) {
        let q = ApproverQuery::new("vccd5fo56ctbigh", amount, ExpenditureKind::Capital, false, tier).unwrap();
        let sel = ApproverResolver::select(&records, &q, &thresholds(), None);
        for pair in sel.candidates.windows(2) {
            let a = (&pair[0].surname, &pair[0].given_name);
            let b = (&pair[1].surname, &pair[1].given_name);
            prop_assert!(a <= b);
        }
    }

    /// Every listed candidate covers the division and the amount it answers for.
    #[test]
    fn prop_candidates_cover_amount(records in arb_records(), amount in arb_amount(), tier in arb_tier()) {
        let t = thresholds();
        let q = ApproverQuery::new("vccd5fo56ctbigh", amount, ExpenditureKind::Capital, false, tier).unwrap();
        let sel = ApproverResolver::select(&records, &q, &t, None);
        let needed = match tier {
            ApproverTier::First if t.requires_second_approval(amount) => t.tier1(),
            _ => amount,
        };
        for approver in &sel.candidates {
            let ok = records.iter().any(|r| {
                r.user_id == approver.id
                    && tier.claims().contains(&r.claim)
                    && r.payload.divisions.is_empty()
                    && r.payload.max_amount.is_some_and(|m| m >= needed)
            });
            prop_assert!(ok, "unqualified candidate {}", approver.id);
        }
    }

    /// Removing the requester never adds candidates and flags exactly when they qualified.
    #[test]
    fn prop_requester_removal(records in arb_records(), amount in arb_amount(), tier in arb_tier(), pick in 0usize..12) {
        let t = thresholds();
        let q = ApproverQuery::new("vccd5fo56ctbigh", amount, ExpenditureKind::Capital, false, tier).unwrap();
        let all = ApproverResolver::select(&records, &q, &t, None);
        let requester = UserId::from_db(format!("user{pick:011}"));
        let sel = ApproverResolver::select(&records, &q, &t, Some(&requester));
        prop_assert!(!sel.contains(&requester));
        prop_assert_eq!(sel.requester_qualifies, all.contains(&requester));
        prop_assert_eq!(sel.candidates.len() + usize::from(sel.requester_qualifies), all.candidates.len());
    }

    /// Relaxed second-tier selection is a superset of strict selection.
    #[test]
    fn prop_relaxed_superset_of_strict(records in arb_records(), amount in arb_amount()) {
        let t = thresholds();
        let strict = ApproverQuery::new("vccd5fo56ctbigh", amount, ExpenditureKind::Capital, false, ApproverTier::Second(SecondTierMode::Strict)).unwrap();
        let relaxed = ApproverQuery::new("vccd5fo56ctbigh", amount, ExpenditureKind::Capital, false, ApproverTier::Second(SecondTierMode::Relaxed)).unwrap();
        let s = ApproverResolver::select(&records, &strict, &t, None);
        let r = ApproverResolver::select(&records, &relaxed, &t, None);
        for approver in &s.candidates {
            prop_assert!(r.contains(&approver.id));
        }
    }
}
