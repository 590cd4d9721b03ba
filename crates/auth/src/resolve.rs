//! Role/permission graph resolution (user → roles → menus → permissions).

use std::collections::BTreeSet;

use serde::Serialize;

use crate::{Menu, Permission, Role, RoleRecord};

/// One role of a user together with the menus granted to that role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    pub role: RoleRecord,
    pub menus: Vec<Menu>,
}

/// Resolved role names and permission strings of a principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthorizationInfo {
    pub roles: BTreeSet<Role>,
    pub permissions: BTreeSet<Permission>,
}

impl AuthorizationInfo {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == role)
    }

    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }
}

/// Walk the grants of a user and collect role names and permission strings.
///
/// Union semantics: a permission granted through any role is granted. The
/// same role or menu appearing twice is harmless.
pub fn resolve_authorization<I>(grants: I) -> AuthorizationInfo
where
    I: IntoIterator<Item = RoleGrant>,
{
    let mut info = AuthorizationInfo::default();
    for grant in grants {
        info.roles.insert(grant.role.name);
        for menu in grant.menus {
            info.permissions.insert(menu.name);
        }
    }
    info
}
