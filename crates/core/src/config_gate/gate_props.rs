//! Property-based tests for editing gates.

use proptest::prelude::*;
use serde_json::{Value, json};

use crate::config_gate::{EditingGate, normalize_bag};

fn arb_non_bool() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-z]{0,12}".prop_map(Value::String),
        Just(json!([])),
        Just(json!({})),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Anything but an explicit boolean leaves the gate open.
    #[test]
    fn prop_fail_open(value in arb_non_bool(), other_key in "[a-z_]{1,16}") {
        let bag = json!({ "create_edit_absorb": value });
        prop_assert!(EditingGate::Jobs.is_enabled(Some(&bag)));

        let unrelated = json!({ other_key: false });
        if unrelated.get("create_edit_absorb").is_none() {
            prop_assert!(EditingGate::Expenses.is_enabled(Some(&unrelated)));
        }
    }

    /// Unparseable stored text reads as a missing row.
    #[test]
    fn prop_garbage_text_is_missing(text in "[^{]{0,40}") {
        let bag = normalize_bag(Value::String(text));
        prop_assert!(bag.is_none() || bag.as_ref().is_some_and(Value::is_object));
        prop_assert!(EditingGate::Jobs.is_enabled(bag.as_ref()));
    }

    /// An explicit boolean is always honoured.
    #[test]
    fn prop_explicit_bool(flag in any::<bool>()) {
        let bag = json!({ "create_edit_absorb": flag });
        prop_assert_eq!(EditingGate::Jobs.is_enabled(Some(&bag)), flag);
    }
}
