//! Runtime feature flags stored as `app_config` rows.
//!
//! Each row is keyed by a domain (`jobs`, `expenses`) and holds a JSON
//! property bag. Editing gates fail open: a missing row, an unreadable bag or
//! a missing or non-boolean key all read as enabled.

use serde_json::Value;

#[cfg(test)]
mod gate_props;

/// `app_config` domain for jobs, clients and contacts.
pub const JOBS_DOMAIN: &str = "jobs";

/// `app_config` domain for expenses and purchase orders.
pub const EXPENSES_DOMAIN: &str = "expenses";

/// Key gating creation, editing and absorption.
pub const CREATE_EDIT_ABSORB_KEY: &str = "create_edit_absorb";

/// Domains whose editing gate can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditingGate {
    /// Jobs, clients and contacts.
    Jobs,
    /// Expenses.
    Expenses,
}

impl EditingGate {
    /// `app_config` key of the domain row.
    #[must_use]
    pub fn domain(&self) -> &'static str {
        match self {
            Self::Jobs => JOBS_DOMAIN,
            Self::Expenses => EXPENSES_DOMAIN,
        }
    }

    /// Evaluates the gate against a domain bag; `None` means the row is
    /// missing or could not be read.
    #[must_use]
    pub fn is_enabled(&self, bag: Option<&Value>) -> bool {
        config_bool(bag, CREATE_EDIT_ABSORB_KEY, true)
    }
}

/// Normalizes a stored bag; JSON text is parsed, anything but an object is
/// discarded.
#[must_use]
pub fn normalize_bag(raw: Value) -> Option<Value> {
    let value = match raw {
        Value::String(text) => serde_json::from_str(&text).ok()?,
        other => other,
    };
    value.is_object().then_some(value)
}

/// Reads a boolean property, falling back to `default`.
#[must_use]
pub fn config_bool(bag: Option<&Value>, key: &str, default: bool) -> bool {
    bag.and_then(|b| b.get(key))
        .and_then(Value::as_bool)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_row_is_enabled() {
        assert!(EditingGate::Jobs.is_enabled(None));
        assert!(EditingGate::Expenses.is_enabled(None));
    }

    #[test]
    fn test_explicit_flag() {
        let off = json!({"create_edit_absorb": false});
        let on = json!({"create_edit_absorb": true});
        assert!(!EditingGate::Jobs.is_enabled(Some(&off)));
        assert!(EditingGate::Jobs.is_enabled(Some(&on)));
    }

    #[test]
    fn test_missing_or_wrong_type_key_is_enabled() {
        assert!(EditingGate::Jobs.is_enabled(Some(&json!({}))));
        assert!(EditingGate::Jobs.is_enabled(Some(&json!({"create_edit_absorb": "no"}))));
    }

    #[test]
    fn test_normalize_bag() {
        assert_eq!(
            normalize_bag(json!("{\"create_edit_absorb\": false}")),
            Some(json!({"create_edit_absorb": false}))
        );
        assert_eq!(normalize_bag(json!("not json")), None);
        assert_eq!(normalize_bag(json!([1, 2])), None);
        assert_eq!(normalize_bag(json!({"a": 1})), Some(json!({"a": 1})));
    }
}
