//! Credential hashing and verification (argon2, PHC string format).

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credential must not be empty")]
    Empty,

    #[error("credential hashing failed: {0}")]
    Hash(String),

    #[error("stored credential hash is malformed")]
    MalformedHash,
}

/// Argon2 hash of a user's password, stored as a PHC string.
///
/// `Debug` never prints the hash itself.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialHash(String);

impl core::fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("CredentialHash([REDACTED])")
    }
}

impl CredentialHash {
    /// Hash a plaintext credential with a fresh random salt.
    pub fn from_plain(plain: &str) -> Result<Self, CredentialError> {
        if plain.is_empty() {
            return Err(CredentialError::Empty);
        }
        let salt = SaltString::generate(&mut rand::rngs::OsRng);
        let hash = Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hash(e.to_string()))?;
        Ok(Self(hash.to_string()))
    }

    /// Wrap an already-hashed PHC string loaded from storage.
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_phc(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison of `plain` against the stored hash.
    pub fn verify(&self, plain: &str) -> Result<bool, CredentialError> {
        let parsed = PasswordHash::new(&self.0).map_err(|_| CredentialError::MalformedHash)?;
        Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }
}

/// What the directory hands back for the caller's comparison step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub username: String,
    pub credential: CredentialHash,
}
