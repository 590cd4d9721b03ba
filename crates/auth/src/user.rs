//! User directory records.

use serde::Serialize;

use depot_core::{DomainError, DomainResult, UserId};

use crate::credentials::{CredentialHash, CredentialRecord};

/// A back-office user.
///
/// # Invariants
/// - `username` is non-empty, trimmed and unique within the directory.
/// - Disabled users cannot log in; their roles are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub credential: CredentialHash,
    pub enabled: bool,
    pub true_name: Option<String>,
    pub remarks: Option<String>,
}

depot_core::impl_entity!(User, UserId);

impl User {
    pub fn new(id: UserId, username: &str, credential: CredentialHash) -> DomainResult<Self> {
        let username = normalize_username(username)?;
        Ok(Self {
            id,
            username,
            credential,
            enabled: true,
            true_name: None,
            remarks: None,
        })
    }

    pub fn with_true_name(mut self, true_name: Option<String>) -> Self {
        self.true_name = true_name.filter(|n| !n.trim().is_empty());
        self
    }

    pub fn with_remarks(mut self, remarks: Option<String>) -> Self {
        self.remarks = remarks;
        self
    }

    pub fn credential_record(&self) -> CredentialRecord {
        CredentialRecord {
            username: self.username.clone(),
            credential: self.credential.clone(),
        }
    }
}

pub fn normalize_username(raw: &str) -> DomainResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("username must not be empty"));
    }
    if trimmed.chars().count() > 50 {
        return Err(DomainError::validation("username must be at most 50 characters"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash() -> CredentialHash {
        CredentialHash::from_phc("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA")
    }

    #[test]
    fn new_user_is_enabled_with_trimmed_name() {
        let user = User::new(UserId::new(), "  alice ", hash()).unwrap();
        assert_eq!(user.username, "alice");
        assert!(user.enabled);
    }

    #[test]
    fn blank_username_is_rejected() {
        let err = User::new(UserId::new(), "   ", hash()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn credential_is_not_serialized() {
        let user = User::new(UserId::new(), "bob", hash()).unwrap();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("credential").is_none());
        assert_eq!(json["username"], "bob");
    }
}
