//! Typed claim payloads.
//!
//! Payloads are stored as JSON property bags. Unrecognized keys are ignored;
//! a missing `divisions` list means "all divisions" and a missing
//! kind-specific maximum means "no additional ceiling".

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::approvers::LimitKey;
use crate::claims::types::ClaimName;

/// Payload could not be interpreted for its claim.
#[derive(Debug, Error)]
#[error("malformed {claim} payload: {source}")]
pub struct PayloadError {
    /// Claim whose payload failed.
    pub claim: ClaimName,
    /// Underlying decode error.
    #[source]
    pub source: serde_json::Error,
}

/// Payload of `po_approver`, `po_approver_tier2` and `po_approver_tier3`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoApproverPayload {
    /// Per-approval ceiling.
    #[serde(default)]
    pub max_amount: Option<Decimal>,
    /// Division ids this grant covers; empty covers every division.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub divisions: Vec<String>,
    /// Minimum value this tier may second-approve.
    #[serde(default)]
    pub lower_threshold: Option<Decimal>,
    /// Ceiling for project spend on jobs.
    #[serde(default)]
    pub project_max: Option<Decimal>,
    /// Ceiling for sponsorships.
    #[serde(default)]
    pub sponsorship_max: Option<Decimal>,
    /// Ceiling for staff and social spend.
    #[serde(default)]
    pub staff_and_social_max: Option<Decimal>,
    /// Ceiling for media and event spend.
    #[serde(default)]
    pub media_and_event_max: Option<Decimal>,
    /// Ceiling for computer purchases.
    #[serde(default)]
    pub computer_max: Option<Decimal>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl PoApproverPayload {
    /// True if the grant covers `division`.
    #[must_use]
    pub fn covers_division(&self, division: &str) -> bool {
        self.divisions.is_empty() || self.divisions.iter().any(|d| d == division)
    }

    /// Kind-specific maximum for `key`, if one is set.
    #[must_use]
    pub fn kind_max(&self, key: LimitKey) -> Option<Decimal> {
        match key {
            LimitKey::MaxAmount => None,
            LimitKey::ProjectMax => self.project_max,
            LimitKey::SponsorshipMax => self.sponsorship_max,
            LimitKey::StaffAndSocialMax => self.staff_and_social_max,
            LimitKey::MediaAndEventMax => self.media_and_event_max,
            LimitKey::ComputerMax => self.computer_max,
        }
    }

    /// Effective ceiling under `key`. A grant without `max_amount` has none.
    #[must_use]
    pub fn effective_ceiling(&self, key: LimitKey) -> Option<Decimal> {
        let base = self.max_amount?;
        Some(match self.kind_max(key) {
            Some(kind_max) => base.min(kind_max),
            None => base,
        })
    }
}

/// Parsed payload of a user claim.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimPayload {
    /// No payload stored.
    Empty,
    /// Approver grant at any tier.
    PoApprover(PoApproverPayload),
    /// Payload of a claim the engine does not interpret.
    Opaque(serde_json::Value),
}

impl ClaimPayload {
    /// Interprets the stored JSON for `claim`.
    pub fn parse(claim: ClaimName, raw: Option<&serde_json::Value>) -> Result<Self, PayloadError> {
        match raw {
            None | Some(serde_json::Value::Null) if !claim.is_po_approver() => Ok(Self::Empty),
            None | Some(serde_json::Value::Null) => {
                Ok(Self::PoApprover(PoApproverPayload::default()))
            }
            Some(value) if claim.is_po_approver() => {
                PoApproverPayload::deserialize(value)
                    .map(Self::PoApprover)
                    .map_err(|source| PayloadError { claim, source })
            }
            Some(value) => Ok(Self::Opaque(value.clone())),
        }
    }

    /// Returns the approver payload, if this is one.
    #[must_use]
    pub fn as_po_approver(&self) -> Option<&PoApproverPayload> {
        match self {
            Self::PoApprover(p) => Some(p),
            _ => None,
        }
    }
}
