//! Storage abstractions.
//!
//! Every store is `Send + Sync` and used behind `Arc<dyn …>`. Two
//! implementations exist: [`crate::memory::InMemoryStore`] for tests and
//! local development, and [`crate::postgres::PgStore`] for production.
//!
//! Reads return `StoreResult` and never hide failures behind empty results.

use thiserror::Error;

use depot_audit::{LogEntry, LogFilter, LogPage, Pagination};
use depot_auth::{Menu, RoleGrant, RoleRecord, User};
use depot_core::{
    CustomerId, CustomerReturnListId, GoodsId, GoodsTypeId, MenuId, PurchaseListId, ReturnListId,
    RoleId, SupplierId, UserId,
};
use depot_parties::{Customer, Supplier};
use depot_products::{Goods, GoodsType};
use depot_purchasing::{
    DocumentFilter, DocumentHeader, PurchaseDocument, PurchaseListGoods, SettlementState,
};

/// Storage failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness rule was violated (duplicate username, document number, …).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A referential or check rule was violated.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The backend itself failed (connection, decoding, poisoned lock).
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Users, roles and menus plus the two many-to-many relations between them.
#[async_trait::async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn insert_user(&self, user: User) -> StoreResult<()>;
    /// Returns `false` when the user does not exist.
    async fn set_user_enabled(&self, id: UserId, enabled: bool) -> StoreResult<bool>;
    async fn roles_of_user(&self, id: UserId) -> StoreResult<Vec<RoleRecord>>;
    /// Replace the user's role set. Unknown role ids are a constraint violation.
    async fn set_user_roles(&self, id: UserId, roles: &[RoleId]) -> StoreResult<()>;

    async fn get_role(&self, id: RoleId) -> StoreResult<Option<RoleRecord>>;
    async fn list_roles(&self) -> StoreResult<Vec<RoleRecord>>;
    async fn insert_role(&self, role: RoleRecord) -> StoreResult<()>;
    async fn menus_of_role(&self, id: RoleId) -> StoreResult<Vec<Menu>>;
    /// Replace the role's menu set. Unknown menu ids are a constraint violation.
    async fn set_role_menus(&self, id: RoleId, menus: &[MenuId]) -> StoreResult<()>;

    async fn list_menus(&self) -> StoreResult<Vec<Menu>>;
    /// Insert the menu, or rename/re-parent it when the id exists.
    async fn upsert_menu(&self, menu: Menu) -> StoreResult<()>;

    /// Every role of the user together with the menus granted to it.
    async fn role_grants(&self, id: UserId) -> StoreResult<Vec<RoleGrant>> {
        let roles = self.roles_of_user(id).await?;
        let mut grants = Vec::with_capacity(roles.len());
        for role in roles {
            let menus = self.menus_of_role(role.id).await?;
            grants.push(RoleGrant { role, menus });
        }
        Ok(grants)
    }
}

/// Suppliers, customers, goods types and goods.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_suppliers(&self) -> StoreResult<Vec<Supplier>>;
    async fn get_supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>>;
    async fn insert_supplier(&self, supplier: Supplier) -> StoreResult<()>;
    /// Returns `false` when the supplier does not exist.
    async fn delete_supplier(&self, id: SupplierId) -> StoreResult<bool>;

    async fn list_customers(&self) -> StoreResult<Vec<Customer>>;
    async fn get_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>>;
    async fn insert_customer(&self, customer: Customer) -> StoreResult<()>;
    async fn delete_customer(&self, id: CustomerId) -> StoreResult<bool>;

    async fn list_goods_types(&self) -> StoreResult<Vec<GoodsType>>;
    async fn insert_goods_type(&self, goods_type: GoodsType) -> StoreResult<()>;
    async fn delete_goods_type(&self, id: GoodsTypeId) -> StoreResult<bool>;

    async fn list_goods(&self) -> StoreResult<Vec<Goods>>;
    async fn get_goods(&self, id: GoodsId) -> StoreResult<Option<Goods>>;
    async fn insert_goods(&self, goods: Goods) -> StoreResult<()>;
    async fn delete_goods(&self, id: GoodsId) -> StoreResult<bool>;
}

/// Header queries shared by every document kind.
#[async_trait::async_trait]
pub trait HeaderStore<Id, P>: Send + Sync
where
    Id: Send + Sync + 'static,
    P: Send + Sync + 'static,
{
    /// Headers matching `filter`, ordered by date descending then number ascending.
    async fn list_headers(&self, filter: &DocumentFilter<P>) -> StoreResult<Vec<DocumentHeader<Id, P>>>;
    async fn get_header(&self, id: Id) -> StoreResult<Option<DocumentHeader<Id, P>>>;
    /// Returns `false` when the document does not exist.
    async fn set_state(&self, id: Id, state: SettlementState) -> StoreResult<bool>;
    /// Highest generated number for `prefix` (the prefix plus exactly four
    /// digits), if any. Free-form numbers sharing the prefix are ignored.
    async fn latest_number(&self, prefix: &str) -> StoreResult<Option<String>>;
}

/// Purchase documents (header plus owned lines).
#[async_trait::async_trait]
pub trait PurchaseStore: HeaderStore<PurchaseListId, SupplierId> {
    /// Persist header, lines and the stock receipt of referenced goods as
    /// one atomic unit. A duplicate number is a [`StoreError::Conflict`].
    async fn insert_document(&self, document: PurchaseDocument) -> StoreResult<()>;
    /// Lines of the document in line order; empty for unknown documents.
    async fn lines(&self, id: PurchaseListId) -> StoreResult<Vec<PurchaseListGoods>>;
    /// Delete header and lines atomically. Returns `false` when absent.
    async fn delete_document(&self, id: PurchaseListId) -> StoreResult<bool>;
}

/// Header-only return documents.
#[async_trait::async_trait]
pub trait ReturnStore<Id, P>: HeaderStore<Id, P>
where
    Id: Send + Sync + 'static,
    P: Send + Sync + 'static,
{
    async fn insert_header(&self, header: DocumentHeader<Id, P>) -> StoreResult<()>;
    async fn delete_header(&self, id: Id) -> StoreResult<bool>;
}

/// Supplier returns.
pub type SupplierReturnStore = dyn ReturnStore<ReturnListId, SupplierId>;

/// Customer returns.
pub type CustomerReturnStore = dyn ReturnStore<CustomerReturnListId, CustomerId>;

/// Append-only audit log.
#[async_trait::async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: LogEntry) -> StoreResult<()>;
    /// Matching entries, newest first.
    async fn list(&self, filter: &LogFilter, pagination: Pagination) -> StoreResult<LogPage>;
}
