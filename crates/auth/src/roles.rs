use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use depot_core::RoleId;

/// Role name used for RBAC.
///
/// Roles are opaque strings at this layer; the permissions a role grants are
/// looked up through its menus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored role row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: Role,
    pub remarks: Option<String>,
}

depot_core::impl_entity!(RoleRecord, RoleId);

impl RoleRecord {
    pub fn new(id: RoleId, name: impl Into<String>, remarks: Option<String>) -> depot_core::DomainResult<Self> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(depot_core::DomainError::validation("role name must not be empty"));
        }
        Ok(Self {
            id,
            name: Role::new(name.to_string()),
            remarks,
        })
    }
}
