//! Authorization resolution and login.
//!
//! Role and permission sets are recomputed from the directory on every
//! call; nothing is cached between requests.

use std::sync::Arc;

use thiserror::Error;
use tracing::{Span, instrument, warn};

use depot_audit::ActionKind;
use depot_auth::{
    AuthorizationInfo, CredentialRecord, Logical, Permission, Principal, User, authorize,
    resolve_authorization,
};

use super::{AuditLog, ServiceError, ServiceResult};
use crate::store::{DirectoryStore, StoreError};

/// Authentication failures. None of them carries the supplied credential.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no such identity")]
    NoSuchIdentity,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account disabled")]
    Disabled,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub authorization: AuthorizationInfo,
}

impl LoginOutcome {
    pub fn principal(&self) -> Principal {
        Principal::new(self.user.id, self.user.username.clone())
    }
}

#[derive(Clone)]
pub struct AuthorizationService {
    directory: Arc<dyn DirectoryStore>,
    audit: AuditLog,
}

impl AuthorizationService {
    pub fn new(directory: Arc<dyn DirectoryStore>, audit: AuditLog) -> Self {
        Self { directory, audit }
    }

    /// Role names and permission strings of `username`: the union over all
    /// of the user's roles. An unknown username is `NotFound`.
    #[instrument(skip(self), fields(role_count, permission_count), err)]
    pub async fn resolve_authorization(&self, username: &str) -> ServiceResult<AuthorizationInfo> {
        let user = self
            .directory
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user '{username}'")))?;
        let grants = self.directory.role_grants(user.id).await?;
        let info = resolve_authorization(grants);

        let span = Span::current();
        span.record("role_count", info.roles.len());
        span.record("permission_count", info.permissions.len());
        Ok(info)
    }

    /// Resolve the principal's permissions and check them against `required`.
    pub async fn require(
        &self,
        principal: &Principal,
        required: &[Permission],
        logical: Logical,
    ) -> ServiceResult<AuthorizationInfo> {
        let info = self.resolve_authorization(&principal.username).await?;
        authorize(&info, required, logical)?;
        Ok(info)
    }

    /// Stored credential record for the caller's comparison step.
    #[instrument(skip(self), err)]
    pub async fn authenticate(&self, username: &str) -> Result<CredentialRecord, AuthError> {
        let user = self
            .directory
            .find_user_by_username(username)
            .await?
            .ok_or(AuthError::NoSuchIdentity)?;
        Ok(user.credential_record())
    }

    /// Verify a password and resolve the user's authorization.
    ///
    /// Disabled accounts are refused even with a correct password. Both
    /// outcomes are written to the audit log.
    #[instrument(skip(self, password), err)]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let user = match self.directory.find_user_by_username(username).await? {
            Some(user) => user,
            None => {
                self.audit
                    .record(ActionKind::Login, format!("login failed for unknown user '{username}'"), None)
                    .await;
                return Err(AuthError::NoSuchIdentity);
            }
        };
        let principal = Principal::new(user.id, user.username.clone());

        let verified = match user.credential.verify(password) {
            Ok(ok) => ok,
            Err(err) => {
                warn!(error = %err, username, "stored credential could not be verified");
                false
            }
        };
        if !verified {
            self.audit
                .record(ActionKind::Login, "login failed: invalid credentials", Some(&principal))
                .await;
            return Err(AuthError::InvalidCredentials);
        }
        if !user.enabled {
            self.audit
                .record(ActionKind::Login, "login refused: account disabled", Some(&principal))
                .await;
            return Err(AuthError::Disabled);
        }

        let grants = self.directory.role_grants(user.id).await?;
        let authorization = resolve_authorization(grants);
        self.audit.record(ActionKind::Login, "user login", Some(&principal)).await;
        Ok(LoginOutcome { user, authorization })
    }

    /// Record an explicit logout.
    pub async fn logout(&self, principal: &Principal) {
        self.audit.record(ActionKind::Logout, "user logout", Some(principal)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::Harness;
    use depot_auth::menus;

    #[tokio::test]
    async fn unknown_user_resolves_to_not_found() {
        let h = Harness::new().await;
        let err = h.services.authorization.resolve_authorization("ghost").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn permissions_are_the_union_over_roles() {
        let h = Harness::new().await;
        let user = h
            .user_with_roles(
                "clerk",
                &[
                    ("buyer", &[menus::PURCHASE_ENTRY, menus::PURCHASE_QUERY]),
                    ("auditor", &[menus::PURCHASE_QUERY, menus::SYSTEM_LOG]),
                ],
            )
            .await;
        let info = h.services.authorization.resolve_authorization(&user.username).await.unwrap();
        assert!(info.has_role("buyer") && info.has_role("auditor"));
        assert_eq!(info.permissions.len(), 3);
        assert!(info.has_permission(&menus::SYSTEM_LOG));
    }

    #[tokio::test]
    async fn require_any_accepts_one_of_the_alternatives() {
        let h = Harness::new().await;
        let user = h.user_with_roles("stats", &[("statistician", &[menus::SUPPLIER_STATISTICS])]).await;
        let principal = Principal::new(user.id, user.username.clone());

        let any = [menus::PURCHASE_QUERY, menus::SUPPLIER_STATISTICS];
        assert!(h.services.authorization.require(&principal, &any, Logical::Any).await.is_ok());
        let err = h.services.authorization.require(&principal, &any, Logical::All).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn authenticate_distinguishes_unknown_identity() {
        let h = Harness::new().await;
        assert_eq!(
            h.services.authorization.authenticate("nobody").await.unwrap_err(),
            AuthError::NoSuchIdentity
        );
        let record = h.services.authorization.authenticate(&h.admin.username).await.unwrap();
        assert_eq!(record.username, h.admin.username);
    }

    #[tokio::test]
    async fn login_checks_password_and_enabled_flag() {
        let h = Harness::new().await;
        let auth = &h.services.authorization;
        assert_eq!(auth.login("admin", "wrong").await.unwrap_err(), AuthError::InvalidCredentials);

        let outcome = auth.login("admin", Harness::PASSWORD).await.unwrap();
        assert!(outcome.authorization.has_permission(&menus::PURCHASE_ENTRY));

        h.store.set_user_enabled(h.admin.user_id, false).await.unwrap();
        assert_eq!(auth.login("admin", Harness::PASSWORD).await.unwrap_err(), AuthError::Disabled);
    }
}
