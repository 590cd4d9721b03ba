use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use depot_core::MenuId;

/// Permission string.
///
/// A permission is the name of a menu entry (e.g. `进货入库`). Holding the
/// permission means some role of the user has been granted that menu.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored menu row. The menu name doubles as the permission string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub id: MenuId,
    pub name: Permission,
    pub parent_id: Option<MenuId>,
}

depot_core::impl_entity!(Menu, MenuId);

/// Well-known menu permissions guarding the back-office endpoints.
pub mod menus {
    use super::Permission;

    pub const PURCHASE_ENTRY: Permission = Permission::from_static("进货入库");
    pub const RETURN_ENTRY: Permission = Permission::from_static("退货出库");
    pub const CUSTOMER_RETURN_ENTRY: Permission = Permission::from_static("客户退货");
    pub const PURCHASE_QUERY: Permission = Permission::from_static("进货单据查询");
    pub const RETURN_QUERY: Permission = Permission::from_static("退货单据查询");
    pub const CUSTOMER_RETURN_QUERY: Permission = Permission::from_static("客户退货单据查询");
    pub const SUPPLIER_STATISTICS: Permission = Permission::from_static("供应商统计");
    pub const CUSTOMER_STATISTICS: Permission = Permission::from_static("客户统计");
    pub const PURCHASE_STATISTICS: Permission = Permission::from_static("商品采购统计");
    pub const SUPPLIER_ADMIN: Permission = Permission::from_static("供应商管理");
    pub const CUSTOMER_ADMIN: Permission = Permission::from_static("客户管理");
    pub const GOODS_ADMIN: Permission = Permission::from_static("商品管理");
    pub const ROLE_ADMIN: Permission = Permission::from_static("角色管理");
    pub const USER_ADMIN: Permission = Permission::from_static("用户管理");
    pub const SYSTEM_LOG: Permission = Permission::from_static("系统日志");

    /// Every menu seeded into a fresh directory.
    pub const ALL: &[Permission] = &[
        PURCHASE_ENTRY,
        RETURN_ENTRY,
        CUSTOMER_RETURN_ENTRY,
        PURCHASE_QUERY,
        RETURN_QUERY,
        CUSTOMER_RETURN_QUERY,
        SUPPLIER_STATISTICS,
        CUSTOMER_STATISTICS,
        PURCHASE_STATISTICS,
        SUPPLIER_ADMIN,
        CUSTOMER_ADMIN,
        GOODS_ADMIN,
        ROLE_ADMIN,
        USER_ADMIN,
        SYSTEM_LOG,
    ];
}
