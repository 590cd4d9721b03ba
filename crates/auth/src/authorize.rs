use serde::{Deserialize, Serialize};
use thiserror::Error;

use depot_core::UserId;

use crate::{AuthorizationInfo, Permission};

/// Authenticated identity of the current operation.
///
/// Passed explicitly into every operation that attributes work to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
}

impl Principal {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}

/// How a list of required permissions combines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Logical {
    /// Every permission is required.
    #[default]
    All,
    /// Any one of the permissions is sufficient.
    Any,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Check resolved authorization info against required permissions.
///
/// - No IO
/// - No panics
/// - An empty requirement list always passes
pub fn authorize(
    info: &AuthorizationInfo,
    required: &[Permission],
    logical: Logical,
) -> Result<(), AuthzError> {
    if required.is_empty() {
        return Ok(());
    }

    match logical {
        Logical::All => match required.iter().find(|p| !info.has_permission(p)) {
            Some(missing) => Err(AuthzError::Forbidden(missing.to_string())),
            None => Ok(()),
        },
        Logical::Any => {
            if required.iter().any(|p| info.has_permission(p)) {
                Ok(())
            } else {
                let names: Vec<&str> = required.iter().map(|p| p.as_str()).collect();
                Err(AuthzError::Forbidden(names.join(" | ")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menus;

    fn info_with(perms: &[Permission]) -> AuthorizationInfo {
        AuthorizationInfo {
            roles: Default::default(),
            permissions: perms.iter().cloned().collect(),
        }
    }

    #[test]
    fn any_passes_with_one_match() {
        let info = info_with(&[menus::SUPPLIER_STATISTICS]);
        let required = [menus::PURCHASE_QUERY, menus::SUPPLIER_STATISTICS];
        assert!(authorize(&info, &required, Logical::Any).is_ok());
    }

    #[test]
    fn any_fails_without_match_and_names_all_candidates() {
        let info = info_with(&[menus::GOODS_ADMIN]);
        let required = [menus::PURCHASE_QUERY, menus::SUPPLIER_STATISTICS];
        let err = authorize(&info, &required, Logical::Any).unwrap_err();
        assert_eq!(err, AuthzError::Forbidden("进货单据查询 | 供应商统计".to_string()));
    }

    #[test]
    fn all_reports_first_missing_permission() {
        let info = info_with(&[menus::PURCHASE_QUERY]);
        let required = [menus::PURCHASE_QUERY, menus::PURCHASE_ENTRY];
        let err = authorize(&info, &required, Logical::All).unwrap_err();
        assert_eq!(err, AuthzError::Forbidden("进货入库".to_string()));
    }

    #[test]
    fn empty_requirement_passes() {
        assert!(authorize(&AuthorizationInfo::default(), &[], Logical::All).is_ok());
    }
}
