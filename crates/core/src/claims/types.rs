//! Claim names and resolved grants.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::claims::payload::ClaimPayload;

/// Capability names understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimName {
    /// First-tier purchase order approver.
    PoApprover,
    /// Second-tier approver for the band above the first threshold.
    PoApproverTier2,
    /// Second-tier approver for the band above the second threshold.
    PoApproverTier3,
    /// May cancel, close and convert purchase orders.
    PayablesAdmin,
    /// May commit approved records.
    Commit,
    /// May merge duplicate clients and contacts.
    Absorb,
    /// Administrative operations such as machine secrets.
    Admin,
    /// Reporting access.
    Report,
    /// Job management.
    Job,
    /// May revise rate sheets.
    RateSheetRevise,
}

impl ClaimName {
    /// Every claim name, in catalog order.
    pub const ALL: [Self; 10] = [
        Self::PoApprover,
        Self::PoApproverTier2,
        Self::PoApproverTier3,
        Self::PayablesAdmin,
        Self::Commit,
        Self::Absorb,
        Self::Admin,
        Self::Report,
        Self::Job,
        Self::RateSheetRevise,
    ];

    /// Returns the stored name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PoApprover => "po_approver",
            Self::PoApproverTier2 => "po_approver_tier2",
            Self::PoApproverTier3 => "po_approver_tier3",
            Self::PayablesAdmin => "payables_admin",
            Self::Commit => "commit",
            Self::Absorb => "absorb",
            Self::Admin => "admin",
            Self::Report => "report",
            Self::Job => "job",
            Self::RateSheetRevise => "rate_sheet_revise",
        }
    }

    /// Parses a stored name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    /// True for the three purchase-order approver claims.
    #[must_use]
    pub fn is_po_approver(&self) -> bool {
        matches!(
            self,
            Self::PoApprover | Self::PoApproverTier2 | Self::PoApproverTier3
        )
    }

    /// True for the claims that may second-approve.
    #[must_use]
    pub fn is_second_tier(&self) -> bool {
        matches!(self, Self::PoApproverTier2 | Self::PoApproverTier3)
    }
}

impl fmt::Display for ClaimName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A claim held by a user together with its parsed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimGrant {
    /// Which claim.
    pub claim: ClaimName,
    /// Scoped payload.
    pub payload: ClaimPayload,
}
