//! Application services.
//!
//! Services own the business operations: they validate input through the
//! domain crates, call the stores, and write audit entries. The acting
//! principal is always an explicit parameter.

pub mod admin;
pub mod audit;
pub mod authorization;
pub mod catalog;
pub mod purchases;
pub mod returns;

use std::sync::Arc;

use thiserror::Error;

use depot_auth::AuthzError;
use depot_core::{CustomerId, CustomerReturnListId, DomainError, ReturnListId, SupplierId};

use crate::store::{
    AuditStore, CatalogStore, CustomerReturnStore, DirectoryStore, PurchaseStore, ReturnStore, StoreError,
    SupplierReturnStore,
};

pub use admin::{AdminService, NewRole, NewUser};
pub use audit::AuditLog;
pub use authorization::{AuthError, AuthorizationService, LoginOutcome};
pub use catalog::{CatalogService, GoodsQuery};
pub use purchases::PurchaseService;
pub use returns::{CustomerReturnService, ReturnService, SupplierReturnService};

/// Failure of a business operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("forbidden: missing permission {0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(what) => ServiceError::NotFound(what),
            DomainError::Validation(msg)
            | DomainError::InvariantViolation(msg)
            | DomainError::InvalidId(msg)
            | DomainError::Conflict(msg) => ServiceError::Validation(msg),
        }
    }
}

/// Uniqueness and referential violations surface as validation failures;
/// only backend faults stay store errors.
impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) | StoreError::Constraint(msg) => ServiceError::Validation(msg),
            backend @ StoreError::Backend(_) => ServiceError::Store(backend),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden(missing) => ServiceError::Forbidden(missing),
        }
    }
}

/// Store handles the services are built from.
#[derive(Clone)]
pub struct Stores {
    pub directory: Arc<dyn DirectoryStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub purchases: Arc<dyn PurchaseStore>,
    pub returns: Arc<SupplierReturnStore>,
    pub customer_returns: Arc<CustomerReturnStore>,
    pub audit: Arc<dyn AuditStore>,
}

impl Stores {
    /// Use one backend for every relation.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: DirectoryStore
            + CatalogStore
            + PurchaseStore
            + ReturnStore<ReturnListId, SupplierId>
            + ReturnStore<CustomerReturnListId, CustomerId>
            + AuditStore
            + 'static,
    {
        Self {
            directory: store.clone(),
            catalog: store.clone(),
            purchases: store.clone(),
            returns: store.clone(),
            customer_returns: store.clone(),
            audit: store,
        }
    }
}

/// Every application service, wired to the same stores and audit log.
#[derive(Clone)]
pub struct Services {
    pub authorization: AuthorizationService,
    pub purchases: PurchaseService,
    pub returns: SupplierReturnService,
    pub customer_returns: CustomerReturnService,
    pub catalog: CatalogService,
    pub admin: AdminService,
    pub audit: AuditLog,
}

impl Services {
    pub fn new(stores: Stores) -> Self {
        let audit = AuditLog::new(stores.audit);
        Self {
            authorization: AuthorizationService::new(stores.directory.clone(), audit.clone()),
            purchases: PurchaseService::new(stores.purchases, stores.catalog.clone(), audit.clone()),
            returns: SupplierReturnService::supplier(stores.returns, audit.clone()),
            customer_returns: CustomerReturnService::customer(stores.customer_returns, audit.clone()),
            catalog: CatalogService::new(stores.catalog, audit.clone()),
            admin: AdminService::new(stores.directory, audit.clone()),
            audit,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing;
