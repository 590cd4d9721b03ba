//! Shared fixtures for service tests.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use depot_audit::{ActionKind, LogEntry, LogFilter, LogPage, Pagination};
use depot_auth::{CredentialHash, Permission, Principal, RoleRecord, User};
use depot_core::{Amount, CustomerId, GoodsId, GoodsTypeId, PurchaseListId, RoleId, SupplierId, UserId};
use depot_parties::{ContactInfo, Customer, PartyDetails, Supplier};
use depot_products::{Goods, GoodsType, NewGoods};
use depot_purchasing::{DocumentFilter, NewDocument, NewLineItem, SettlementState};

use super::{Services, Stores};
use crate::memory::InMemoryStore;
use crate::seed::seed_directory;
use crate::store::{
    AuditStore, CatalogStore, DirectoryStore, HeaderStore, StoreError, StoreResult,
};

/// Audit sink whose every call fails.
pub(crate) struct FailingAudit;

#[async_trait::async_trait]
impl AuditStore for FailingAudit {
    async fn append(&self, _entry: LogEntry) -> StoreResult<()> {
        Err(StoreError::Backend("audit sink unavailable".into()))
    }

    async fn list(&self, _filter: &LogFilter, _pagination: Pagination) -> StoreResult<LogPage> {
        Err(StoreError::Backend("audit sink unavailable".into()))
    }
}

/// Audit sink that snapshots the stored purchase numbers whenever a DELETE
/// entry is appended, then forwards the entry to the store.
pub(crate) struct SnapshottingAudit {
    store: Arc<InMemoryStore>,
    pub snapshots: Mutex<Vec<(String, Vec<String>)>>,
}

impl SnapshottingAudit {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self {
            store,
            snapshots: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl AuditStore for SnapshottingAudit {
    async fn append(&self, entry: LogEntry) -> StoreResult<()> {
        if entry.kind() == ActionKind::Delete {
            let numbers = HeaderStore::<PurchaseListId, SupplierId>::list_headers(
                self.store.as_ref(),
                &DocumentFilter::default(),
            )
            .await?
            .into_iter()
            .map(|h| h.number)
            .collect();
            self.snapshots
                .lock()
                .unwrap()
                .push((entry.description().to_string(), numbers));
        }
        AuditStore::append(self.store.as_ref(), entry).await
    }

    async fn list(&self, filter: &LogFilter, pagination: Pagination) -> StoreResult<LogPage> {
        AuditStore::list(self.store.as_ref(), filter, pagination).await
    }
}

pub(crate) struct Harness {
    pub store: Arc<InMemoryStore>,
    pub services: Services,
    pub admin: Principal,
    pub supplier: SupplierId,
    pub customer: CustomerId,
    pub goods_type: GoodsTypeId,
}

impl Harness {
    pub const PASSWORD: &'static str = "correct horse";

    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::build(store.clone(), store).await
    }

    pub async fn with_audit(audit: Arc<dyn AuditStore>) -> Self {
        Self::build(Arc::new(InMemoryStore::new()), audit).await
    }

    /// Harness whose audit sink is built over the harness's own store.
    pub async fn with_audit_over<A>(make: impl FnOnce(Arc<InMemoryStore>) -> Arc<A>) -> (Self, Arc<A>)
    where
        A: AuditStore + 'static,
    {
        let store = Arc::new(InMemoryStore::new());
        let audit = make(store.clone());
        let harness = Self::build(store, audit.clone()).await;
        (harness, audit)
    }

    async fn build(store: Arc<InMemoryStore>, audit: Arc<dyn AuditStore>) -> Self {
        let admin = seed_directory(store.as_ref(), Self::PASSWORD).await.unwrap();

        let supplier = Supplier::new(
            SupplierId::new(),
            PartyDetails::new("Acme Trading", ContactInfo::default(), None).unwrap(),
        );
        store.insert_supplier(supplier.clone()).await.unwrap();
        let customer = Customer::new(
            CustomerId::new(),
            PartyDetails::new("Corner Shop", ContactInfo::default(), None).unwrap(),
        );
        store.insert_customer(customer.clone()).await.unwrap();
        let goods_type = GoodsType::new(GoodsTypeId::new(), "Beverages", None).unwrap();
        store.insert_goods_type(goods_type.clone()).await.unwrap();

        let stores = Stores {
            audit,
            ..Stores::shared(store.clone())
        };
        Self {
            store,
            services: Services::new(stores),
            admin,
            supplier: supplier.id,
            customer: customer.id,
            goods_type: goods_type.id,
        }
    }

    /// Outstanding purchase header from the fixture supplier.
    pub fn draft(&self, number: &str, date: NaiveDate) -> NewDocument<SupplierId> {
        NewDocument {
            number: number.into(),
            party_id: self.supplier,
            date,
            amount_payable: Amount::from_minor(40),
            state: SettlementState::Outstanding,
            remarks: None,
        }
    }

    /// Free-text line (no catalog goods) in the fixture goods type.
    pub fn line(&self, code: &str, price: i64, num: i64) -> NewLineItem {
        NewLineItem {
            goods_id: None,
            code: code.into(),
            name: format!("{code} item"),
            model: String::new(),
            unit: "pcs".into(),
            price: Amount::from_minor(price),
            num,
            type_id: self.goods_type,
        }
    }

    /// Register catalog goods with no stock.
    pub async fn goods(&self, code: &str) -> GoodsId {
        let goods = Goods::create(
            GoodsId::new(),
            NewGoods {
                code: code.into(),
                name: format!("{code} item"),
                model: String::new(),
                unit: "pcs".into(),
                type_id: self.goods_type,
                purchasing_price: Amount::ZERO,
                selling_price: Amount::ZERO,
                inventory_quantity: 0,
            },
        )
        .unwrap();
        let id = goods.id;
        self.store.insert_goods(goods).await.unwrap();
        id
    }

    /// Create a user holding freshly created roles, each granted the given
    /// permissions.
    pub async fn user_with_roles(&self, username: &str, roles: &[(&str, &[Permission])]) -> User {
        let menus = self.store.list_menus().await.unwrap();
        let user = User::new(UserId::new(), username, CredentialHash::from_plain(Self::PASSWORD).unwrap()).unwrap();
        self.store.insert_user(user.clone()).await.unwrap();

        let mut role_ids = Vec::new();
        for (name, permissions) in roles {
            let role = RoleRecord::new(RoleId::new(), *name, None).unwrap();
            self.store.insert_role(role.clone()).await.unwrap();
            let menu_ids: Vec<_> = menus
                .iter()
                .filter(|m| permissions.contains(&m.name))
                .map(|m| m.id)
                .collect();
            self.store.set_role_menus(role.id, &menu_ids).await.unwrap();
            role_ids.push(role.id);
        }
        self.store.set_user_roles(user.id, &role_ids).await.unwrap();
        user
    }
}
