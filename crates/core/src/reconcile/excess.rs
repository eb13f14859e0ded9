//! How far committed expenses may run past a Cumulative purchase order total.

use rust_decimal::Decimal;
use serde_json::Value;

/// Which of the two allowances applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExcessMode {
    /// The smaller allowance wins.
    #[default]
    LesserOf,
    /// The larger allowance wins.
    GreaterOf,
}

impl ExcessMode {
    /// Parses a configured mode.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lesser_of" => Some(Self::LesserOf),
            "greater_of" => Some(Self::GreaterOf),
            _ => None,
        }
    }
}

/// Allowed excess over a purchase order total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExcessPolicy {
    /// Fractional allowance, `0.05` for 5%.
    pub percent: Decimal,
    /// Absolute allowance in dollars.
    pub value: Decimal,
    /// Which allowance applies.
    pub mode: ExcessMode,
}

impl Default for ExcessPolicy {
    fn default() -> Self {
        Self {
            percent: Decimal::new(5, 2),
            value: Decimal::ONE_HUNDRED,
            mode: ExcessMode::LesserOf,
        }
    }
}

/// Computed ceiling for committed expenses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcessLimit {
    /// Largest allowed sum of committed expenses.
    pub total_limit: Decimal,
    /// The applied allowance, for error messages.
    pub excess_text: String,
}

impl ExcessPolicy {
    /// Reads `po_expense_allowed_excess` from the `expenses` config bag.
    ///
    /// Each field overrides its default only when valid: `percent` is a
    /// number in `0..=100` (a percentage), `value` a number `>= 0`, `mode`
    /// one of `lesser_of`/`greater_of`.
    #[must_use]
    pub fn from_config(expenses: Option<&Value>) -> Self {
        let mut policy = Self::default();
        let Some(excess) = expenses
            .and_then(|v| v.get("po_expense_allowed_excess"))
            .and_then(Value::as_object)
        else {
            return policy;
        };

        if let Some(percent) = excess
            .get("percent")
            .and_then(json_decimal)
            .filter(|p| (Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(p))
        {
            policy.percent = percent / Decimal::ONE_HUNDRED;
        }
        if let Some(value) = excess
            .get("value")
            .and_then(json_decimal)
            .filter(|v| *v >= Decimal::ZERO)
        {
            policy.value = value;
        }
        if let Some(mode) = excess
            .get("mode")
            .and_then(Value::as_str)
            .and_then(ExcessMode::parse)
        {
            policy.mode = mode;
        }
        policy
    }

    /// Ceiling for a purchase order with the given total.
    #[must_use]
    pub fn limit(&self, po_total: Decimal) -> ExcessLimit {
        let percent_excess = po_total * self.percent;
        let use_value = match self.mode {
            ExcessMode::LesserOf => self.value < percent_excess,
            ExcessMode::GreaterOf => self.value >= percent_excess,
        };
        if use_value {
            ExcessLimit {
                total_limit: po_total + self.value,
                excess_text: format!("${:.2}", self.value),
            }
        } else {
            ExcessLimit {
                total_limit: po_total + percent_excess,
                excess_text: format!("{:.2}%", self.percent * Decimal::ONE_HUNDRED),
            }
        }
    }
}

fn json_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}
