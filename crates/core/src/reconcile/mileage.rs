//! Banded mileage reimbursement.
//!
//! An expense rate row carries a `mileage` object mapping the lower bound of
//! each distance band (km, as a string key) to a per-km rate. A trip is
//! priced by splitting `[prior, prior + distance)` across the bands, where
//! `prior` is the distance the user already committed since the last reset.

use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use crate::reconcile::error::ReconcileError;

/// Sorted mileage bands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MileageRates {
    bands: Vec<(i64, Decimal)>,
}

impl MileageRates {
    /// Parses the `mileage` JSON of an expense rate row.
    ///
    /// # Errors
    /// `InvalidMileageRates` when the value is not an object, a key is not a
    /// non-negative integer, a rate is not a number, or there are no bands.
    pub fn from_json(value: &Value) -> Result<Self, ReconcileError> {
        let object = value
            .as_object()
            .ok_or_else(|| ReconcileError::InvalidMileageRates("not an object".to_string()))?;

        let mut bands = Vec::with_capacity(object.len());
        for (key, rate) in object {
            let lower: i64 = key
                .parse()
                .ok()
                .filter(|n| *n >= 0)
                .ok_or_else(|| ReconcileError::InvalidMileageRates(format!("bad band {key}")))?;
            let rate: Decimal = match rate {
                Value::Number(n) => n.to_string().parse().ok(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            }
            .ok_or_else(|| ReconcileError::InvalidMileageRates(format!("bad rate for {key}")))?;
            bands.push((lower, rate));
        }
        Self::new(bands)
    }

    /// Builds rates from `(lower_bound_km, rate)` pairs.
    pub fn new(mut bands: Vec<(i64, Decimal)>) -> Result<Self, ReconcileError> {
        if bands.is_empty() {
            return Err(ReconcileError::InvalidMileageRates(
                "no mileage rates found".to_string(),
            ));
        }
        bands.sort_by_key(|(lower, _)| *lower);
        Ok(Self { bands })
    }

    /// Unrounded price of `distance` km driven after `prior` km.
    ///
    /// The lowest band also covers everything below its bound.
    #[must_use]
    pub fn raw_amount(&self, prior: i64, distance: i64) -> Decimal {
        let start = prior;
        let end = prior.saturating_add(distance);
        let mut amount = Decimal::ZERO;
        for (i, (lower, rate)) in self.bands.iter().enumerate() {
            let band_start = if i == 0 { i64::MIN } else { *lower };
            let band_end = self.bands.get(i + 1).map_or(i64::MAX, |(next, _)| *next);
            let overlap = end.min(band_end) - start.max(band_start);
            if overlap > 0 {
                amount += Decimal::from(overlap) * rate;
            }
        }
        amount
    }

    /// Price in cents-rounded dollars.
    #[must_use]
    pub fn amount(&self, prior: i64, distance: i64) -> Decimal {
        self.raw_amount(prior, distance)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// Validates a mileage distance and returns whole kilometres.
///
/// # Errors
/// `InvalidMileageDistance` for fractional or negative distances.
pub fn whole_distance(distance: Decimal) -> Result<i64, ReconcileError> {
    if distance.is_sign_negative() || !distance.fract().is_zero() {
        return Err(ReconcileError::InvalidMileageDistance);
    }
    i64::try_from(distance).map_err(|_| ReconcileError::InvalidMileageDistance)
}
