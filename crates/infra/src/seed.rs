//! Bootstrap data for a fresh directory.
//!
//! Safe to run on every start: existing menus, the admin role and the admin
//! user are reused, never duplicated.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{info, instrument};

use depot_auth::{CredentialError, CredentialHash, Menu, Principal, RoleRecord, User, menus};
use depot_core::{DomainError, MenuId, RoleId, UserId};

use crate::store::{DirectoryStore, StoreError};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_ROLE: &str = "administrator";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("cannot hash bootstrap credential: {0}")]
    Credential(#[from] CredentialError),
}

/// Ensure every well-known menu exists, the admin role holds all of them and
/// the admin user exists with that role. Returns the admin principal.
///
/// `admin_password` is only used when the admin user has to be created.
#[instrument(skip(directory, admin_password), err)]
pub async fn seed_directory(directory: &dyn DirectoryStore, admin_password: &str) -> Result<Principal, SeedError> {
    let mut existing = directory.list_menus().await?;
    for permission in menus::ALL {
        if existing.iter().any(|m| &m.name == permission) {
            continue;
        }
        let menu = Menu {
            id: MenuId::new(),
            name: permission.clone(),
            parent_id: None,
        };
        directory.upsert_menu(menu.clone()).await?;
        existing.push(menu);
    }
    let all_menus: Vec<MenuId> = existing.iter().map(|m| m.id).collect();

    let role = match directory
        .list_roles()
        .await?
        .into_iter()
        .find(|r| r.name.as_str() == ADMIN_ROLE)
    {
        Some(role) => role,
        None => {
            let role = RoleRecord::new(RoleId::new(), ADMIN_ROLE, Some("full access".into()))?;
            directory.insert_role(role.clone()).await?;
            role
        }
    };
    directory.set_role_menus(role.id, &all_menus).await?;

    let admin = match directory.find_user_by_username(ADMIN_USERNAME).await? {
        Some(user) => user,
        None => {
            let user = User::new(UserId::new(), ADMIN_USERNAME, CredentialHash::from_plain(admin_password)?)?;
            directory.insert_user(user.clone()).await?;
            info!(username = ADMIN_USERNAME, "bootstrap admin user created");
            user
        }
    };

    let mut roles: BTreeSet<RoleId> = directory.roles_of_user(admin.id).await?.into_iter().map(|r| r.id).collect();
    if roles.insert(role.id) {
        let roles: Vec<RoleId> = roles.into_iter().collect();
        directory.set_user_roles(admin.id, &roles).await?;
    }

    Ok(Principal::new(admin.id, admin.username))
}
