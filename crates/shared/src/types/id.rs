//! Typed record ids.
//!
//! Records are keyed by 15-character lowercase alphanumeric strings. Using a
//! distinct type per collection prevents passing a `UserId` where a
//! `PurchaseOrderId` is expected.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of every record id.
pub const RECORD_ID_LEN: usize = 15;

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Rejected id input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid record id {0:?}")]
pub struct IdError(pub String);

/// Returns true if `s` has the record id shape.
#[must_use]
pub fn is_record_id(s: &str) -> bool {
    s.len() == RECORD_ID_LEN
        && s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

/// Generates a fresh random record id.
#[must_use]
pub fn generate_record_id() -> String {
    let mut rng = rand::rng();
    (0..RECORD_ID_LEN)
        .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
        .collect()
}

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new random id.
            #[must_use]
            pub fn generate() -> Self {
                Self(generate_record_id())
            }

            /// Wraps a value read back from the store without re-validating it.
            #[must_use]
            pub const fn from_db(value: String) -> Self {
                Self(value)
            }

            /// Borrows the id.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if is_record_id(s) {
                    Ok(Self(s.to_string()))
                } else {
                    Err(IdError(s.to_string()))
                }
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user.");
typed_id!(PurchaseOrderId, "Unique identifier for a purchase order.");
typed_id!(ExpenseId, "Unique identifier for an expense.");
typed_id!(DivisionId, "Unique identifier for a division.");
typed_id!(NotificationId, "Unique identifier for a queued notification.");
typed_id!(MachineSecretId, "Unique identifier for a machine secret.");
