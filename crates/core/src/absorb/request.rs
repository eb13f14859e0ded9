//! Validation of absorb requests.

use backoffice_shared::types::is_record_id;

use crate::absorb::collection::AbsorbCollection;
use crate::absorb::error::AbsorbError;

/// A checked absorb request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsorbPlan {
    /// Collection being merged.
    pub collection: AbsorbCollection,
    /// Surviving record.
    pub target_id: String,
    /// Records merged into the target, deduplicated in request order.
    pub source_ids: Vec<String>,
}

impl AbsorbPlan {
    /// Checks caller and request shape.
    ///
    /// # Errors
    /// `EmptyIds`, `SelfAbsorb`, `Unauthorized` or `JobsEditingDisabled`,
    /// in that order.
    pub fn new(
        collection: AbsorbCollection,
        target_id: &str,
        ids_to_absorb: &[String],
        has_absorb_claim: bool,
        jobs_editing_enabled: bool,
    ) -> Result<Self, AbsorbError> {
        if ids_to_absorb.is_empty() {
            return Err(AbsorbError::EmptyIds);
        }
        if ids_to_absorb.iter().any(|id| id == target_id) {
            return Err(AbsorbError::SelfAbsorb);
        }
        if !has_absorb_claim {
            return Err(AbsorbError::Unauthorized);
        }
        if !jobs_editing_enabled {
            return Err(AbsorbError::JobsEditingDisabled);
        }

        let mut source_ids: Vec<String> = Vec::with_capacity(ids_to_absorb.len());
        for id in ids_to_absorb {
            if !source_ids.contains(id) {
                source_ids.push(id.clone());
            }
        }

        Ok(Self {
            collection,
            target_id: target_id.to_string(),
            source_ids,
        })
    }

    /// Ids that can never match a stored record.
    #[must_use]
    pub fn malformed_ids(&self) -> Vec<&str> {
        self.source_ids
            .iter()
            .map(String::as_str)
            .filter(|id| !is_record_id(id))
            .collect()
    }

    /// Checks the parent constraint for one source.
    ///
    /// # Errors
    /// `ParentMismatch` when the collection has a parent column and the values
    /// differ.
    pub fn check_parent(
        &self,
        target_parent: Option<&str>,
        source_parent: Option<&str>,
    ) -> Result<(), AbsorbError> {
        match self.collection.parent_column() {
            Some(column) if target_parent != source_parent => {
                Err(AbsorbError::ParentMismatch(column))
            }
            _ => Ok(()),
        }
    }

    /// Response message.
    #[must_use]
    pub fn success_message(&self) -> String {
        format!(
            "Successfully absorbed {} records into {}",
            self.source_ids.len(),
            self.target_id
        )
    }
}
