//! Expenditure kinds and the payload ceiling each one selects.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::approvers::error::ApproverError;

/// Classification of spend on a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenditureKind {
    /// Capital purchases.
    Capital,
    /// General expenses.
    Expense,
    /// Spend attributed to a project.
    Project,
    /// Sponsorships.
    Sponsorship,
    /// Staff and social events.
    StaffAndSocial,
    /// Media and events.
    MediaAndEvent,
    /// Computer hardware and software.
    Computer,
}

impl ExpenditureKind {
    /// Returns the stored name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Capital => "capital",
            Self::Expense => "expense",
            Self::Project => "project",
            Self::Sponsorship => "sponsorship",
            Self::StaffAndSocial => "staff_and_social",
            Self::MediaAndEvent => "media_and_event",
            Self::Computer => "computer",
        }
    }

    /// Parses a stored name; surrounding whitespace is ignored.
    pub fn parse(s: &str) -> Result<Self, ApproverError> {
        match s.trim() {
            "capital" => Ok(Self::Capital),
            "expense" => Ok(Self::Expense),
            "project" => Ok(Self::Project),
            "sponsorship" => Ok(Self::Sponsorship),
            "staff_and_social" => Ok(Self::StaffAndSocial),
            "media_and_event" => Ok(Self::MediaAndEvent),
            "computer" => Ok(Self::Computer),
            other => Err(ApproverError::InvalidKind(other.to_string())),
        }
    }

    /// Payload key whose ceiling applies to this kind.
    ///
    /// Without a job the project ceiling never applies.
    #[must_use]
    pub fn limit_key(&self, has_job: bool) -> LimitKey {
        match self {
            Self::Project if has_job => LimitKey::ProjectMax,
            Self::Sponsorship => LimitKey::SponsorshipMax,
            Self::StaffAndSocial => LimitKey::StaffAndSocialMax,
            Self::MediaAndEvent => LimitKey::MediaAndEventMax,
            Self::Computer => LimitKey::ComputerMax,
            Self::Project | Self::Capital | Self::Expense => LimitKey::MaxAmount,
        }
    }
}

impl fmt::Display for ExpenditureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approver payload key holding the ceiling for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitKey {
    /// `max_amount` only.
    MaxAmount,
    /// `project_max`.
    ProjectMax,
    /// `sponsorship_max`.
    SponsorshipMax,
    /// `staff_and_social_max`.
    StaffAndSocialMax,
    /// `media_and_event_max`.
    MediaAndEventMax,
    /// `computer_max`.
    ComputerMax,
}

impl LimitKey {
    /// Payload key name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxAmount => "max_amount",
            Self::ProjectMax => "project_max",
            Self::SponsorshipMax => "sponsorship_max",
            Self::StaffAndSocialMax => "staff_and_social_max",
            Self::MediaAndEventMax => "media_and_event_max",
            Self::ComputerMax => "computer_max",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("project", true, LimitKey::ProjectMax)]
    #[case("project", false, LimitKey::MaxAmount)]
    #[case("sponsorship", false, LimitKey::SponsorshipMax)]
    #[case("sponsorship", true, LimitKey::SponsorshipMax)]
    #[case("staff_and_social", true, LimitKey::StaffAndSocialMax)]
    #[case("media_and_event", false, LimitKey::MediaAndEventMax)]
    #[case("computer", true, LimitKey::ComputerMax)]
    #[case("capital", true, LimitKey::MaxAmount)]
    #[case("expense", false, LimitKey::MaxAmount)]
    fn test_limit_key_table(#[case] kind: &str, #[case] has_job: bool, #[case] key: LimitKey) {
        assert_eq!(ExpenditureKind::parse(kind).unwrap().limit_key(has_job), key);
    }

    #[test]
    fn test_unknown_kind() {
        assert!(matches!(
            ExpenditureKind::parse("yachts"),
            Err(ApproverError::InvalidKind(k)) if k == "yachts"
        ));
        assert!(ExpenditureKind::parse("   ").is_err());
        assert_eq!(
            ExpenditureKind::parse(" computer ").unwrap(),
            ExpenditureKind::Computer
        );
    }
}
