//! Property-based tests for reconciliation arithmetic.

use chrono::{Datelike, NaiveDate, Weekday};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::reconcile::excess::{ExcessMode, ExcessPolicy};
use crate::reconcile::mileage::MileageRates;
use crate::reconcile::service::week_ending;

fn arb_money() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_policy() -> impl Strategy<Value = ExcessPolicy> {
    (0i64..=100, 0i64..100_000, any::<bool>()).prop_map(|(p, v, greater)| ExcessPolicy {
        percent: Decimal::new(p, 2),
        value: Decimal::new(v, 2),
        mode: if greater {
            ExcessMode::GreaterOf
        } else {
            ExcessMode::LesserOf
        },
    })
}

fn arb_rates() -> impl Strategy<Value = MileageRates> {
    prop::collection::btree_map(0i64..20_000, 1i64..200, 1..5).prop_map(|bands| {
        MileageRates::new(
            bands
                .into_iter()
                .map(|(lower, cents)| (lower, Decimal::new(cents, 2)))
                .collect(),
        )
        .unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The limit never falls below the total and lesser_of never exceeds greater_of.
    #[test]
    fn prop_excess_limit_bounds(total in arb_money(), policy in arb_policy()) {
        let lesser = ExcessPolicy { mode: ExcessMode::LesserOf, ..policy }.limit(total);
        let greater = ExcessPolicy { mode: ExcessMode::GreaterOf, ..policy }.limit(total);
        prop_assert!(lesser.total_limit >= total);
        prop_assert!(lesser.total_limit <= greater.total_limit);
        prop_assert!(greater.total_limit <= total + policy.value.max(total * policy.percent));
    }

    /// Splitting a trip in two never changes its price.
    #[test]
    fn prop_mileage_additive(
        rates in arb_rates(),
        prior in 0i64..30_000,
        first in 0i64..5_000,
        second in 0i64..5_000,
    ) {
        let whole = rates.amount(prior, first + second);
        let split = rates.amount(prior, first) + rates.amount(prior + first, second);
        prop_assert_eq!(whole, split);
    }

    /// Week ending is a Saturday within six days.
    #[test]
    fn prop_week_ending_is_next_saturday(days in 0i64..20_000) {
        let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + chrono::Duration::days(days);
        let end = week_ending(date);
        prop_assert_eq!(end.weekday(), Weekday::Sat);
        let gap = (end - date).num_days();
        prop_assert!((0..=6).contains(&gap));
    }
}
