//! Salted bearer secrets for machine callers.
//!
//! A secret is shown once at creation. Only `sha256(salt || secret)` (hex)
//! and the salt are stored, together with a role and an expiry.

use backoffice_shared::{AppError, ErrorKind};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Default nanoid alphabet, used for secrets.
pub const SECRET_ALPHABET: &[u8] =
    b"_-0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Alphanumeric alphabet, used for salts.
pub const SALT_ALPHABET: &[u8] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Secret length.
pub const SECRET_LEN: usize = 32;

/// Salt length.
pub const SALT_LEN: usize = 21;

/// Longest allowed lifetime in days.
pub const MAX_DAYS: i64 = 365;

/// Roles a machine secret can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineRole {
    /// Legacy system writing records back.
    LegacyWriteback,
}

impl MachineRole {
    /// Stored value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LegacyWriteback => "legacy_writeback",
        }
    }

    /// Parses a stored or requested role.
    ///
    /// # Errors
    /// `InvalidRole` for unknown roles.
    pub fn parse(s: &str) -> Result<Self, MachineSecretError> {
        match s {
            "legacy_writeback" => Ok(Self::LegacyWriteback),
            _ => Err(MachineSecretError::InvalidRole),
        }
    }
}

impl fmt::Display for MachineRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from machine secret management and verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineSecretError {
    /// Caller lacks the `admin` claim.
    #[error("Admin claim required")]
    AdminRequired,

    /// `days` outside `1..=365`.
    #[error("days must be an integer between 1 and {MAX_DAYS}")]
    InvalidDays,

    /// Unknown role.
    #[error("Invalid role")]
    InvalidRole,

    /// Missing, expired or unknown machine token.
    #[error("Invalid or expired machine token")]
    InvalidToken,

    /// Wrapped store error.
    #[error("{message}")]
    Database {
        /// Operation-specific code.
        code: &'static str,
        /// Store message.
        message: String,
    },
}

impl MachineSecretError {
    /// Wraps a store error under an operation-specific code.
    pub fn database(code: &'static str, err: impl fmt::Display) -> Self {
        Self::Database {
            code,
            message: err.to_string(),
        }
    }

    /// Returns the taxonomy kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AdminRequired => ErrorKind::Authorization,
            Self::InvalidDays | Self::InvalidRole => ErrorKind::InputValidation,
            Self::InvalidToken => ErrorKind::Unauthenticated,
            Self::Database { .. } => ErrorKind::Downstream,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AdminRequired => "admin_claim_required",
            Self::InvalidDays => "invalid_days",
            Self::InvalidRole => "invalid_role",
            Self::InvalidToken => "invalid_machine_token",
            Self::Database { code, .. } => code,
        }
    }
}

impl From<MachineSecretError> for AppError {
    fn from(err: MachineSecretError) -> Self {
        Self::new(err.kind(), err.error_code(), err.to_string())
    }
}

/// A stored secret row, as far as verification needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSecret {
    /// Hex digest of `salt || secret`.
    pub sha256_hash: String,
    /// Salt.
    pub salt: String,
    /// Role.
    pub role: String,
    /// Expiry.
    pub expiry: DateTime<Utc>,
}

/// A freshly minted secret; `secret` must be shown once and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedSecret {
    /// Plain secret.
    pub secret: String,
    /// Salt to store.
    pub salt: String,
    /// Digest to store.
    pub sha256_hash: String,
    /// Role.
    pub role: MachineRole,
    /// Expiry.
    pub expiry: DateTime<Utc>,
}

fn random_string(alphabet: &[u8], len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(alphabet[rng.random_range(0..alphabet.len())]))
        .collect()
}

/// Hex `sha256(salt || token)`.
#[must_use]
pub fn hash_secret(salt: &str, token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Stateless machine token service.
pub struct MachineTokens;

impl MachineTokens {
    /// Validates a creation request.
    ///
    /// # Errors
    /// `InvalidDays` or `InvalidRole`.
    pub fn validate_request(days: i64, role: &str) -> Result<MachineRole, MachineSecretError> {
        if !(1..=MAX_DAYS).contains(&days) {
            return Err(MachineSecretError::InvalidDays);
        }
        MachineRole::parse(role)
    }

    /// Generates a secret, salt and digest expiring `days` after `now`.
    #[must_use]
    pub fn mint(role: MachineRole, days: i64, now: DateTime<Utc>) -> MintedSecret {
        let secret = random_string(SECRET_ALPHABET, SECRET_LEN);
        let salt = random_string(SALT_ALPHABET, SALT_LEN);
        let sha256_hash = hash_secret(&salt, &secret);
        MintedSecret {
            secret,
            salt,
            sha256_hash,
            role,
            expiry: now + Duration::days(days),
        }
    }

    /// True if any unexpired secret of `role` matches `token`.
    ///
    /// Surrounding whitespace and newlines on the token are ignored.
    #[must_use]
    pub fn verify(
        token: &str,
        role: MachineRole,
        secrets: &[StoredSecret],
        now: DateTime<Utc>,
    ) -> bool {
        let token = token.trim();
        if token.is_empty() {
            return false;
        }
        secrets
            .iter()
            .filter(|s| s.role == role.as_str() && s.expiry > now)
            .any(|s| hash_secret(&s.salt, token) == s.sha256_hash)
    }
}
