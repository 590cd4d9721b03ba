//! User, role and menu administration.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use depot_audit::ActionKind;
use depot_auth::{CredentialHash, Menu, Principal, RoleRecord, User};
use depot_core::{MenuId, RoleId, UserId};

use super::{AuditLog, ServiceError, ServiceResult};
use crate::store::{DirectoryStore, StoreError};

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: SecretString,
    #[serde(default)]
    pub true_name: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRole {
    pub name: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Clone)]
pub struct AdminService {
    directory: Arc<dyn DirectoryStore>,
    audit: AuditLog,
}

impl AdminService {
    pub fn new(directory: Arc<dyn DirectoryStore>, audit: AuditLog) -> Self {
        Self { directory, audit }
    }

    pub async fn list_users(&self, principal: &Principal) -> ServiceResult<Vec<User>> {
        let users = self.directory.list_users().await?;
        self.audit.record(ActionKind::Select, "query users", Some(principal)).await;
        Ok(users)
    }

    /// Create an enabled user with no roles. The password is stored as an
    /// argon2 hash only.
    #[instrument(skip(self, principal, input), fields(user = %principal.username, username = %input.username), err)]
    pub async fn create_user(&self, principal: &Principal, input: NewUser) -> ServiceResult<User> {
        let credential =
            CredentialHash::from_plain(input.password.expose_secret()).map_err(|e| ServiceError::Validation(e.to_string()))?;
        let user = User::new(UserId::new(), &input.username, credential)?
            .with_true_name(input.true_name)
            .with_remarks(input.remarks);

        self.directory.insert_user(user.clone()).await.map_err(|err| match err {
            StoreError::Conflict(_) => ServiceError::Validation(format!("username '{}' already exists", user.username)),
            other => other.into(),
        })?;
        self.audit
            .record(ActionKind::Insert, format!("add user {}", user.username), Some(principal))
            .await;
        Ok(user)
    }

    /// Disabled users keep their roles but can no longer log in.
    #[instrument(skip(self, principal), fields(user = %principal.username), err)]
    pub async fn set_user_enabled(&self, principal: &Principal, id: UserId, enabled: bool) -> ServiceResult<User> {
        if id == principal.user_id && !enabled {
            return Err(ServiceError::Validation("cannot disable your own account".into()));
        }
        if !self.directory.set_user_enabled(id, enabled).await? {
            return Err(ServiceError::NotFound(format!("user {id}")));
        }
        let user = self
            .directory
            .get_user(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {id}")))?;
        let verb = if enabled { "enable" } else { "disable" };
        self.audit
            .record(ActionKind::Update, format!("{verb} user {}", user.username), Some(principal))
            .await;
        Ok(user)
    }

    pub async fn roles_of_user(&self, principal: &Principal, id: UserId) -> ServiceResult<Vec<RoleRecord>> {
        if self.directory.get_user(id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("user {id}")));
        }
        let roles = self.directory.roles_of_user(id).await?;
        self.audit.record(ActionKind::Select, "query user roles", Some(principal)).await;
        Ok(roles)
    }

    /// Replace the user's role set.
    #[instrument(skip(self, principal, roles), fields(user = %principal.username, role_count = roles.len()), err)]
    pub async fn assign_roles(&self, principal: &Principal, id: UserId, roles: &[RoleId]) -> ServiceResult<Vec<RoleRecord>> {
        let user = self
            .directory
            .get_user(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {id}")))?;
        self.directory.set_user_roles(id, roles).await?;
        let assigned = self.directory.roles_of_user(id).await?;
        let names: Vec<&str> = assigned.iter().map(|r| r.name.as_str()).collect();
        self.audit
            .record(
                ActionKind::Update,
                format!("set roles of user {} to [{}]", user.username, names.join(", ")),
                Some(principal),
            )
            .await;
        Ok(assigned)
    }

    pub async fn list_roles(&self, principal: &Principal) -> ServiceResult<Vec<RoleRecord>> {
        let roles = self.directory.list_roles().await?;
        self.audit.record(ActionKind::Select, "query roles", Some(principal)).await;
        Ok(roles)
    }

    #[instrument(skip(self, principal, input), fields(user = %principal.username, role = %input.name), err)]
    pub async fn create_role(&self, principal: &Principal, input: NewRole) -> ServiceResult<RoleRecord> {
        let role = RoleRecord::new(RoleId::new(), input.name, input.remarks)?;
        self.directory.insert_role(role.clone()).await.map_err(|err| match err {
            StoreError::Conflict(_) => ServiceError::Validation(format!("role '{}' already exists", role.name)),
            other => other.into(),
        })?;
        self.audit
            .record(ActionKind::Insert, format!("add role {}", role.name), Some(principal))
            .await;
        Ok(role)
    }

    pub async fn menus_of_role(&self, principal: &Principal, id: RoleId) -> ServiceResult<Vec<Menu>> {
        if self.directory.get_role(id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("role {id}")));
        }
        let menus = self.directory.menus_of_role(id).await?;
        self.audit.record(ActionKind::Select, "query role menus", Some(principal)).await;
        Ok(menus)
    }

    /// Replace the role's menu set.
    #[instrument(skip(self, principal, menus), fields(user = %principal.username, menu_count = menus.len()), err)]
    pub async fn grant_menus(&self, principal: &Principal, id: RoleId, menus: &[MenuId]) -> ServiceResult<Vec<Menu>> {
        let role = self
            .directory
            .get_role(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("role {id}")))?;
        self.directory.set_role_menus(id, menus).await?;
        let granted = self.directory.menus_of_role(id).await?;
        self.audit
            .record(
                ActionKind::Update,
                format!("grant {} menus to role {}", granted.len(), role.name),
                Some(principal),
            )
            .await;
        Ok(granted)
    }

    pub async fn list_menus(&self, principal: &Principal) -> ServiceResult<Vec<Menu>> {
        let menus = self.directory.list_menus().await?;
        self.audit.record(ActionKind::Select, "query menus", Some(principal)).await;
        Ok(menus)
    }
}
