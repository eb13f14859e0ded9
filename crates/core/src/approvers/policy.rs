//! Approver candidate selection.
//!
//! The store hands over every approver grant for the queried claims; this
//! module decides who qualifies for a (division, amount, kind, has_job, tier)
//! query and in which order they are listed.

use std::collections::HashSet;

use backoffice_shared::types::UserId;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::approvers::error::ApproverError;
use crate::approvers::kind::{ExpenditureKind, LimitKey};
use crate::claims::{ClaimName, PoApproverPayload};

/// Ordered tier ceilings; the first entry is T1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalThresholds {
    ceilings: Vec<Decimal>,
}

impl ApprovalThresholds {
    /// Builds thresholds from configured ceilings in any order.
    pub fn new(mut ceilings: Vec<Decimal>) -> Result<Self, ApproverError> {
        if ceilings.is_empty() {
            return Err(ApproverError::ThresholdsMissing);
        }
        ceilings.sort();
        Ok(Self { ceilings })
    }

    /// Tier-1 ceiling.
    #[must_use]
    pub fn tier1(&self) -> Decimal {
        self.ceilings[0]
    }

    /// All ceilings, ascending.
    #[must_use]
    pub fn ceilings(&self) -> &[Decimal] {
        &self.ceilings
    }

    /// True when `approval_total` needs a second approval.
    #[must_use]
    pub fn requires_second_approval(&self, approval_total: Decimal) -> bool {
        approval_total > self.tier1()
    }

    /// Lower threshold of a second-tier claim when its payload omits one:
    /// the ceiling of the tier below it.
    #[must_use]
    pub fn default_lower_threshold(&self, claim: ClaimName) -> Decimal {
        let index = match claim {
            ClaimName::PoApproverTier3 => 1,
            _ => 0,
        };
        self.ceilings
            .get(index)
            .or_else(|| self.ceilings.last())
            .copied()
            .unwrap_or_default()
    }
}

/// How strictly second-tier holders are filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondTierMode {
    /// Enforce `lower_threshold < amount` (approval path).
    Strict,
    /// Skip the lower threshold so any covering holder may act (rejection path).
    Relaxed,
}

/// Which pool a query draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproverTier {
    /// `po_approver` holders.
    First,
    /// `po_approver_tier2` and `po_approver_tier3` holders.
    Second(SecondTierMode),
}

impl ApproverTier {
    /// Claims whose holders belong to this pool.
    #[must_use]
    pub fn claims(&self) -> &'static [ClaimName] {
        match self {
            Self::First => &[ClaimName::PoApprover],
            Self::Second(_) => &[ClaimName::PoApproverTier2, ClaimName::PoApproverTier3],
        }
    }
}

/// A candidate approver query.
#[derive(Debug, Clone)]
pub struct ApproverQuery {
    /// Division of the purchase order.
    pub division: String,
    /// Amount authorization is measured against.
    pub amount: Decimal,
    /// Expenditure kind of the purchase order.
    pub kind: ExpenditureKind,
    /// Whether the purchase order is attached to a job.
    pub has_job: bool,
    /// Pool to draw from.
    pub tier: ApproverTier,
}

impl ApproverQuery {
    /// Validates raw inputs and builds a query.
    pub fn new(
        division: &str,
        amount: Decimal,
        kind: ExpenditureKind,
        has_job: bool,
        tier: ApproverTier,
    ) -> Result<Self, ApproverError> {
        let division = division.trim();
        if division.is_empty() {
            return Err(ApproverError::InvalidDivision);
        }
        if amount.is_sign_negative() {
            return Err(ApproverError::InvalidAmount);
        }
        Ok(Self {
            division: division.to_string(),
            amount,
            kind,
            has_job,
            tier,
        })
    }

    /// Payload key that supplies the ceiling.
    #[must_use]
    pub fn limit_key(&self) -> LimitKey {
        self.kind.limit_key(self.has_job)
    }
}

/// One approver grant as read from the store.
#[derive(Debug, Clone)]
pub struct CandidateRecord {
    /// Grant holder.
    pub user_id: UserId,
    /// Holder's given name.
    pub given_name: String,
    /// Holder's surname.
    pub surname: String,
    /// Which approver claim the grant is for.
    pub claim: ClaimName,
    /// Grant payload.
    pub payload: PoApproverPayload,
}

/// A listed approver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Approver {
    /// User id.
    pub id: UserId,
    /// Given name.
    pub given_name: String,
    /// Surname.
    pub surname: String,
}

/// Result of a candidate query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApproverSelection {
    /// Qualifying users other than the requester, by surname then given name.
    pub candidates: Vec<Approver>,
    /// The requester qualified and was removed from `candidates`.
    pub requester_qualifies: bool,
}

impl ApproverSelection {
    /// True if `user` is listed.
    #[must_use]
    pub fn contains(&self, user: &UserId) -> bool {
        self.candidates.iter().any(|a| &a.id == user)
    }
}

/// Stateless candidate resolver.
pub struct ApproverResolver;

impl ApproverResolver {
    /// Selects the qualifying candidates for `query` from `records`.
    ///
    /// `records` may contain grants for any claim; only those in the query's
    /// pool are considered. A user holding several qualifying grants is
    /// listed once.
    #[must_use]
    pub fn select(
        records: &[CandidateRecord],
        query: &ApproverQuery,
        thresholds: &ApprovalThresholds,
        requester: Option<&UserId>,
    ) -> ApproverSelection {
        let qualifying = match query.tier {
            ApproverTier::First => Self::first_tier(records, query, thresholds),
            ApproverTier::Second(mode) => Self::second_tier(records, query, thresholds, mode),
        };

        let mut seen = HashSet::new();
        let mut candidates: Vec<Approver> = qualifying
            .into_iter()
            .filter(|r| seen.insert(r.user_id.clone()))
            .map(|r| Approver {
                id: r.user_id.clone(),
                given_name: r.given_name.clone(),
                surname: r.surname.clone(),
            })
            .collect();
        candidates.sort_by(|a, b| {
            a.surname
                .cmp(&b.surname)
                .then_with(|| a.given_name.cmp(&b.given_name))
        });

        let mut requester_qualifies = false;
        if let Some(requester) = requester {
            let before = candidates.len();
            candidates.retain(|a| &a.id != requester);
            requester_qualifies = candidates.len() != before;
        }

        ApproverSelection {
            candidates,
            requester_qualifies,
        }
    }

    /// True if `user` qualifies for `query`.
    #[must_use]
    pub fn qualifies(
        user: &UserId,
        records: &[CandidateRecord],
        query: &ApproverQuery,
        thresholds: &ApprovalThresholds,
    ) -> bool {
        Self::select(records, query, thresholds, None).contains(user)
    }

    /// Amount a first approver must be able to cover. When a second approval
    /// will follow, the first approver only answers for the band up to T1.
    fn first_tier_amount(query: &ApproverQuery, thresholds: &ApprovalThresholds) -> Decimal {
        if thresholds.requires_second_approval(query.amount) {
            thresholds.tier1()
        } else {
            query.amount
        }
    }

    fn covers(record: &CandidateRecord, query: &ApproverQuery, amount: Decimal) -> bool {
        record.payload.covers_division(&query.division)
            && record
                .payload
                .effective_ceiling(query.limit_key())
                .is_some_and(|ceiling| ceiling >= amount)
    }

    fn first_tier<'a>(
        records: &'a [CandidateRecord],
        query: &ApproverQuery,
        thresholds: &ApprovalThresholds,
    ) -> Vec<&'a CandidateRecord> {
        let amount = Self::first_tier_amount(query, thresholds);
        records
            .iter()
            .filter(|r| r.claim == ClaimName::PoApprover)
            .filter(|r| Self::covers(r, query, amount))
            .collect()
    }

    fn second_tier<'a>(
        records: &'a [CandidateRecord],
        query: &ApproverQuery,
        thresholds: &ApprovalThresholds,
        mode: SecondTierMode,
    ) -> Vec<&'a CandidateRecord> {
        let base: Vec<&CandidateRecord> = records
            .iter()
            .filter(|r| r.claim.is_second_tier())
            .filter(|r| Self::covers(r, query, query.amount))
            .collect();

        if mode == SecondTierMode::Relaxed {
            return base;
        }

        let mut selected: Vec<&CandidateRecord> = base
            .iter()
            .copied()
            .filter(|r| {
                let lower = r
                    .payload
                    .lower_threshold
                    .unwrap_or_else(|| thresholds.default_lower_threshold(r.claim));
                lower < query.amount
            })
            .collect();

        // Tier-3 holders step in when no tier-2 holder can take the amount.
        let has_tier2 = selected
            .iter()
            .any(|r| r.claim == ClaimName::PoApproverTier2);
        if !has_tier2 && thresholds.requires_second_approval(query.amount) {
            for record in base
                .iter()
                .copied()
                .filter(|r| r.claim == ClaimName::PoApproverTier3)
            {
                if !selected.iter().any(|s| std::ptr::eq(*s, record)) {
                    selected.push(record);
                }
            }
        }
        selected
    }
}

/// Outcome label of a second-approver lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondApproverStatus {
    /// The amount does not need a second approval.
    NotRequired,
    /// The requester can give the second approval themselves.
    RequesterQualifies,
    /// Other users can give the second approval.
    CandidatesAvailable,
    /// A second approval is needed but nobody can give it.
    RequiredNoCandidates,
}

/// Metadata accompanying a second-approver lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecondApproverMeta {
    /// Whether the amount exceeds T1.
    pub second_approval_required: bool,
    /// Whether the requester qualifies as second approver.
    pub requester_qualifies: bool,
    /// Summary status.
    pub status: SecondApproverStatus,
    /// Machine-readable reason.
    pub reason_code: &'static str,
    /// T1.
    pub second_approval_threshold: Decimal,
}

impl SecondApproverMeta {
    /// Builds the metadata for a lookup of `amount`.
    #[must_use]
    pub fn describe(
        thresholds: &ApprovalThresholds,
        amount: Decimal,
        selection: &ApproverSelection,
    ) -> Self {
        let required = thresholds.requires_second_approval(amount);
        let (status, reason_code) = if !required {
            (SecondApproverStatus::NotRequired, "second_approval_not_required")
        } else if selection.requester_qualifies {
            (
                SecondApproverStatus::RequesterQualifies,
                "requester_is_eligible_second_approver",
            )
        } else if !selection.candidates.is_empty() {
            (
                SecondApproverStatus::CandidatesAvailable,
                "eligible_second_approvers_available",
            )
        } else {
            (
                SecondApproverStatus::RequiredNoCandidates,
                "no_eligible_second_approvers",
            )
        };
        Self {
            second_approval_required: required,
            requester_qualifies: required && selection.requester_qualifies,
            status,
            reason_code,
            second_approval_threshold: thresholds.tier1(),
        }
    }
}
