//! Absorbable collections and the rows that reference them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::absorb::error::AbsorbError;

/// A `(child_table, child_column)` pair pointing at the absorbed collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    /// Referencing table.
    pub table: &'static str,
    /// Referencing column.
    pub column: &'static str,
}

const CLIENT_REFERENCES: &[Reference] = &[
    Reference {
        table: "client_contacts",
        column: "client",
    },
    Reference {
        table: "client_notes",
        column: "client",
    },
    Reference {
        table: "jobs",
        column: "client",
    },
];

const CONTACT_REFERENCES: &[Reference] = &[Reference {
    table: "jobs",
    column: "contact",
}];

/// Collections whose records can be merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbsorbCollection {
    /// `clients`
    Clients,
    /// `contacts`, stored in `client_contacts`
    Contacts,
}

impl AbsorbCollection {
    /// Resolves a path segment.
    ///
    /// # Errors
    /// `UnknownCollection` for anything else.
    pub fn parse(name: &str) -> Result<Self, AbsorbError> {
        match name {
            "clients" => Ok(Self::Clients),
            "contacts" => Ok(Self::Contacts),
            other => Err(AbsorbError::UnknownCollection(other.to_string())),
        }
    }

    /// Path and audit name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Contacts => "contacts",
        }
    }

    /// Table holding the records.
    #[must_use]
    pub fn table(&self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Contacts => "client_contacts",
        }
    }

    /// Columns rewritten to the target.
    #[must_use]
    pub fn references(&self) -> &'static [Reference] {
        match self {
            Self::Clients => CLIENT_REFERENCES,
            Self::Contacts => CONTACT_REFERENCES,
        }
    }

    /// Column that must match between target and sources.
    #[must_use]
    pub fn parent_column(&self) -> Option<&'static str> {
        match self {
            Self::Clients => None,
            Self::Contacts => Some("client"),
        }
    }

    /// Column of `table` among this collection's references.
    #[must_use]
    pub fn column_for(&self, table: &str) -> Option<&'static str> {
        self.references()
            .iter()
            .find(|r| r.table == table)
            .map(|r| r.column)
    }
}

/// Previous values of rewritten references: table → row id → old value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdatedReferences(BTreeMap<String, BTreeMap<String, String>>);

impl UpdatedReferences {
    /// Records that `row_id` in `table` pointed at `old_value`.
    pub fn track(&mut self, table: &str, row_id: String, old_value: String) {
        self.0
            .entry(table.to_string())
            .or_default()
            .insert(row_id, old_value);
    }

    /// Iterates `(table, row_id, old_value)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.0.iter().flat_map(|(table, rows)| {
            rows.iter()
                .map(move |(id, old)| (table.as_str(), id.as_str(), old.as_str()))
        })
    }

    /// Number of rewritten rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    /// True if nothing was rewritten.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
