//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl AsRef<Uuid> for $t {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_newtype!(
    /// Identifier of a back-office user (actor identity).
    UserId,
    "UserId"
);
uuid_newtype!(
    /// Identifier of a role.
    RoleId,
    "RoleId"
);
uuid_newtype!(
    /// Identifier of a menu entry (a grantable permission).
    MenuId,
    "MenuId"
);
uuid_newtype!(SupplierId, "SupplierId");
uuid_newtype!(CustomerId, "CustomerId");
uuid_newtype!(GoodsTypeId, "GoodsTypeId");
uuid_newtype!(GoodsId, "GoodsId");
uuid_newtype!(
    /// Identifier of a purchase document header.
    PurchaseListId,
    "PurchaseListId"
);
uuid_newtype!(PurchaseListGoodsId, "PurchaseListGoodsId");
uuid_newtype!(ReturnListId, "ReturnListId");
uuid_newtype!(CustomerReturnListId, "CustomerReturnListId");
uuid_newtype!(
    /// Identifier of an audit log entry.
    LogId,
    "LogId"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_display() {
        let id = PurchaseListId::new();
        let parsed: PurchaseListId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_error_names_the_id_type() {
        let err = "not-a-uuid".parse::<SupplierId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(ref m) if m.starts_with("SupplierId")));
    }
}
