//! In-memory store for tests and local development.
//!
//! All relations live behind a single `RwLock`, so every write method is
//! atomic with respect to readers: a failed write leaves nothing behind.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use depot_audit::{LogEntry, LogFilter, LogPage, Pagination};
use depot_auth::{Menu, RoleRecord, User};
use depot_core::{
    AggregateRoot, CustomerId, CustomerReturnListId, Entity, GoodsId, GoodsTypeId, MenuId,
    PurchaseListId, ReturnListId, RoleId, SupplierId, UserId,
};
use depot_parties::{Customer, Supplier};
use depot_products::{Goods, GoodsType};
use depot_purchasing::{
    CustomerReturnList, DocumentFilter, DocumentHeader, PurchaseDocument, PurchaseList,
    PurchaseListGoods, ReturnList, SettlementState, is_sequenced, sort_documents,
};

use crate::store::{
    AuditStore, CatalogStore, DirectoryStore, HeaderStore, PurchaseStore, ReturnStore, StoreError,
    StoreResult,
};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    user_roles: HashMap<UserId, BTreeSet<RoleId>>,
    roles: HashMap<RoleId, RoleRecord>,
    role_menus: HashMap<RoleId, BTreeSet<MenuId>>,
    menus: HashMap<MenuId, Menu>,

    suppliers: HashMap<SupplierId, Supplier>,
    customers: HashMap<CustomerId, Customer>,
    goods_types: HashMap<GoodsTypeId, GoodsType>,
    goods: HashMap<GoodsId, Goods>,

    purchases: HashMap<PurchaseListId, PurchaseDocument>,
    returns: HashMap<ReturnListId, ReturnList>,
    customer_returns: HashMap<CustomerReturnListId, CustomerReturnList>,

    logs: Vec<LogEntry>,
}

/// In-memory implementation of every store trait.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".into()))
    }
}

fn put<E: Entity>(map: &mut HashMap<E::Id, E>, entity: E) {
    map.insert(entity.id().clone(), entity);
}

fn list_matching<'a, Id, P, I>(headers: I, filter: &DocumentFilter<P>) -> Vec<DocumentHeader<Id, P>>
where
    Id: Clone + 'a,
    P: Clone + PartialEq + 'a,
    I: Iterator<Item = &'a DocumentHeader<Id, P>>,
{
    let mut hits: Vec<_> = headers.filter(|h| filter.matches(h)).cloned().collect();
    sort_documents(&mut hits);
    hits
}

fn latest_with_prefix<'a, Id, P, I>(headers: I, prefix: &str) -> Option<String>
where
    Id: 'a,
    P: 'a,
    I: Iterator<Item = &'a DocumentHeader<Id, P>>,
{
    headers
        .map(|h| h.number.as_str())
        .filter(|n| is_sequenced(prefix, n))
        .max()
        .map(str::to_string)
}

#[async_trait::async_trait]
impl DirectoryStore for InMemoryStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let state = self.read()?;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.read()?.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn insert_user(&self, user: User) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!("username '{}' already exists", user.username)));
        }
        put(&mut state.users, user);
        Ok(())
    }

    async fn set_user_enabled(&self, id: UserId, enabled: bool) -> StoreResult<bool> {
        let mut state = self.write()?;
        match state.users.get_mut(&id) {
            Some(user) => {
                user.enabled = enabled;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn roles_of_user(&self, id: UserId) -> StoreResult<Vec<RoleRecord>> {
        let state = self.read()?;
        let Some(role_ids) = state.user_roles.get(&id) else {
            return Ok(Vec::new());
        };
        let mut roles: Vec<RoleRecord> = role_ids.iter().filter_map(|r| state.roles.get(r).cloned()).collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn set_user_roles(&self, id: UserId, roles: &[RoleId]) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.users.contains_key(&id) {
            return Err(StoreError::Constraint(format!("user {id} does not exist")));
        }
        if let Some(missing) = roles.iter().find(|r| !state.roles.contains_key(r)) {
            return Err(StoreError::Constraint(format!("role {missing} does not exist")));
        }
        state.user_roles.insert(id, roles.iter().copied().collect());
        Ok(())
    }

    async fn get_role(&self, id: RoleId) -> StoreResult<Option<RoleRecord>> {
        Ok(self.read()?.roles.get(&id).cloned())
    }

    async fn list_roles(&self) -> StoreResult<Vec<RoleRecord>> {
        let mut roles: Vec<RoleRecord> = self.read()?.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn insert_role(&self, role: RoleRecord) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.roles.values().any(|r| r.name == role.name) {
            return Err(StoreError::Conflict(format!("role '{}' already exists", role.name)));
        }
        put(&mut state.roles, role);
        Ok(())
    }

    async fn menus_of_role(&self, id: RoleId) -> StoreResult<Vec<Menu>> {
        let state = self.read()?;
        let Some(menu_ids) = state.role_menus.get(&id) else {
            return Ok(Vec::new());
        };
        let mut menus: Vec<Menu> = menu_ids.iter().filter_map(|m| state.menus.get(m).cloned()).collect();
        menus.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(menus)
    }

    async fn set_role_menus(&self, id: RoleId, menus: &[MenuId]) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.roles.contains_key(&id) {
            return Err(StoreError::Constraint(format!("role {id} does not exist")));
        }
        if let Some(missing) = menus.iter().find(|m| !state.menus.contains_key(m)) {
            return Err(StoreError::Constraint(format!("menu {missing} does not exist")));
        }
        state.role_menus.insert(id, menus.iter().copied().collect());
        Ok(())
    }

    async fn list_menus(&self) -> StoreResult<Vec<Menu>> {
        let mut menus: Vec<Menu> = self.read()?.menus.values().cloned().collect();
        menus.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(menus)
    }

    async fn upsert_menu(&self, menu: Menu) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.menus.values().any(|m| m.name == menu.name && m.id != menu.id) {
            return Err(StoreError::Conflict(format!("menu '{}' already exists", menu.name)));
        }
        put(&mut state.menus, menu);
        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_suppliers(&self) -> StoreResult<Vec<Supplier>> {
        let mut all: Vec<Supplier> = self.read()?.suppliers.values().cloned().collect();
        all.sort_by(|a, b| a.details.name.cmp(&b.details.name));
        Ok(all)
    }

    async fn get_supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>> {
        Ok(self.read()?.suppliers.get(&id).cloned())
    }

    async fn insert_supplier(&self, supplier: Supplier) -> StoreResult<()> {
        put(&mut self.write()?.suppliers, supplier);
        Ok(())
    }

    async fn delete_supplier(&self, id: SupplierId) -> StoreResult<bool> {
        let mut state = self.write()?;
        let referenced = state.purchases.values().any(|d| d.header.party_id == id)
            || state.returns.values().any(|r| r.party_id == id);
        if referenced {
            return Err(StoreError::Constraint(format!("supplier {id} is referenced by documents")));
        }
        Ok(state.suppliers.remove(&id).is_some())
    }

    async fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        let mut all: Vec<Customer> = self.read()?.customers.values().cloned().collect();
        all.sort_by(|a, b| a.details.name.cmp(&b.details.name));
        Ok(all)
    }

    async fn get_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        Ok(self.read()?.customers.get(&id).cloned())
    }

    async fn insert_customer(&self, customer: Customer) -> StoreResult<()> {
        put(&mut self.write()?.customers, customer);
        Ok(())
    }

    async fn delete_customer(&self, id: CustomerId) -> StoreResult<bool> {
        let mut state = self.write()?;
        if state.customer_returns.values().any(|r| r.party_id == id) {
            return Err(StoreError::Constraint(format!("customer {id} is referenced by documents")));
        }
        Ok(state.customers.remove(&id).is_some())
    }

    async fn list_goods_types(&self) -> StoreResult<Vec<GoodsType>> {
        let mut all: Vec<GoodsType> = self.read()?.goods_types.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn insert_goods_type(&self, goods_type: GoodsType) -> StoreResult<()> {
        let mut state = self.write()?;
        if let Some(parent) = goods_type.parent_id {
            if !state.goods_types.contains_key(&parent) {
                return Err(StoreError::Constraint(format!("goods type {parent} does not exist")));
            }
        }
        put(&mut state.goods_types, goods_type);
        Ok(())
    }

    async fn delete_goods_type(&self, id: GoodsTypeId) -> StoreResult<bool> {
        let mut state = self.write()?;
        let referenced = state.goods_types.values().any(|t| t.parent_id == Some(id))
            || state.goods.values().any(|g| g.type_id == id)
            || state
                .purchases
                .values()
                .any(|d| d.lines.iter().any(|l| l.type_id == id));
        if referenced {
            return Err(StoreError::Constraint(format!("goods type {id} is still in use")));
        }
        Ok(state.goods_types.remove(&id).is_some())
    }

    async fn list_goods(&self) -> StoreResult<Vec<Goods>> {
        let mut all: Vec<Goods> = self.read()?.goods.values().cloned().collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(all)
    }

    async fn get_goods(&self, id: GoodsId) -> StoreResult<Option<Goods>> {
        Ok(self.read()?.goods.get(&id).cloned())
    }

    async fn insert_goods(&self, goods: Goods) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.goods_types.contains_key(&goods.type_id) {
            return Err(StoreError::Constraint(format!("goods type {} does not exist", goods.type_id)));
        }
        if state.goods.values().any(|g| g.code == goods.code) {
            return Err(StoreError::Conflict(format!("goods code '{}' already exists", goods.code)));
        }
        put(&mut state.goods, goods);
        Ok(())
    }

    async fn delete_goods(&self, id: GoodsId) -> StoreResult<bool> {
        let mut state = self.write()?;
        let removed = state.goods.remove(&id).is_some();
        if removed {
            // Lines keep their code/name snapshot.
            for doc in state.purchases.values_mut() {
                for line in doc.lines.iter_mut().filter(|l| l.goods_id == Some(id)) {
                    line.goods_id = None;
                }
            }
        }
        Ok(removed)
    }
}

#[async_trait::async_trait]
impl HeaderStore<PurchaseListId, SupplierId> for InMemoryStore {
    async fn list_headers(&self, filter: &DocumentFilter<SupplierId>) -> StoreResult<Vec<PurchaseList>> {
        let state = self.read()?;
        Ok(list_matching(state.purchases.values().map(|d| &d.header), filter))
    }

    async fn get_header(&self, id: PurchaseListId) -> StoreResult<Option<PurchaseList>> {
        Ok(self.read()?.purchases.get(&id).map(|d| d.header.clone()))
    }

    async fn set_state(&self, id: PurchaseListId, state: SettlementState) -> StoreResult<bool> {
        let mut guard = self.write()?;
        match guard.purchases.get_mut(&id) {
            Some(doc) => {
                doc.header.set_state(state);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn latest_number(&self, prefix: &str) -> StoreResult<Option<String>> {
        let state = self.read()?;
        Ok(latest_with_prefix(state.purchases.values().map(|d| &d.header), prefix))
    }
}

#[async_trait::async_trait]
impl PurchaseStore for InMemoryStore {
    async fn insert_document(&self, document: PurchaseDocument) -> StoreResult<()> {
        let mut state = self.write()?;
        let header = &document.header;

        if state.purchases.values().any(|d| d.header.number == header.number) {
            return Err(StoreError::Conflict(format!("purchase number '{}' already exists", header.number)));
        }
        if !state.suppliers.contains_key(&header.party_id) {
            return Err(StoreError::Constraint(format!("supplier {} does not exist", header.party_id)));
        }
        if let Some(line) = document.children().iter().find(|l| !state.goods_types.contains_key(&l.type_id)) {
            return Err(StoreError::Constraint(format!("goods type {} does not exist", line.type_id)));
        }

        // Stock receipt is computed on copies and applied only once every line succeeded.
        let mut received: HashMap<GoodsId, Goods> = HashMap::new();
        for line in document.children() {
            let Some(goods_id) = line.goods_id else { continue };
            let goods = match received.entry(goods_id) {
                Entry::Occupied(slot) => slot.into_mut(),
                Entry::Vacant(slot) => {
                    let current = state
                        .goods
                        .get(&goods_id)
                        .cloned()
                        .ok_or_else(|| StoreError::Constraint(format!("goods {goods_id} does not exist")))?;
                    slot.insert(current)
                }
            };
            goods
                .receive(line.num, line.price)
                .map_err(|e| StoreError::Constraint(e.to_string()))?;
        }

        state.goods.extend(received);
        state.purchases.insert(*document.id(), document);
        Ok(())
    }

    async fn lines(&self, id: PurchaseListId) -> StoreResult<Vec<PurchaseListGoods>> {
        let state = self.read()?;
        let mut lines = state.purchases.get(&id).map(|d| d.lines.clone()).unwrap_or_default();
        lines.sort_by_key(|l| l.line_no);
        Ok(lines)
    }

    async fn delete_document(&self, id: PurchaseListId) -> StoreResult<bool> {
        Ok(self.write()?.purchases.remove(&id).is_some())
    }
}

macro_rules! impl_return_store {
    ($id:ty, $party:ty, $field:ident, $party_map:ident, $label:literal) => {
        #[async_trait::async_trait]
        impl HeaderStore<$id, $party> for InMemoryStore {
            async fn list_headers(
                &self,
                filter: &DocumentFilter<$party>,
            ) -> StoreResult<Vec<DocumentHeader<$id, $party>>> {
                let state = self.read()?;
                Ok(list_matching(state.$field.values(), filter))
            }

            async fn get_header(&self, id: $id) -> StoreResult<Option<DocumentHeader<$id, $party>>> {
                Ok(self.read()?.$field.get(&id).cloned())
            }

            async fn set_state(&self, id: $id, state: SettlementState) -> StoreResult<bool> {
                let mut guard = self.write()?;
                match guard.$field.get_mut(&id) {
                    Some(header) => {
                        header.set_state(state);
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }

            async fn latest_number(&self, prefix: &str) -> StoreResult<Option<String>> {
                let state = self.read()?;
                Ok(latest_with_prefix(state.$field.values(), prefix))
            }
        }

        #[async_trait::async_trait]
        impl ReturnStore<$id, $party> for InMemoryStore {
            async fn insert_header(&self, header: DocumentHeader<$id, $party>) -> StoreResult<()> {
                let mut state = self.write()?;
                if state.$field.values().any(|h| h.number == header.number) {
                    return Err(StoreError::Conflict(format!(
                        concat!($label, " number '{}' already exists"),
                        header.number
                    )));
                }
                if !state.$party_map.contains_key(&header.party_id) {
                    return Err(StoreError::Constraint(format!("party {} does not exist", header.party_id)));
                }
                state.$field.insert(header.id, header);
                Ok(())
            }

            async fn delete_header(&self, id: $id) -> StoreResult<bool> {
                Ok(self.write()?.$field.remove(&id).is_some())
            }
        }
    };
}

impl_return_store!(ReturnListId, SupplierId, returns, suppliers, "return");
impl_return_store!(CustomerReturnListId, CustomerId, customer_returns, customers, "customer return");

#[async_trait::async_trait]
impl AuditStore for InMemoryStore {
    async fn append(&self, entry: LogEntry) -> StoreResult<()> {
        self.write()?.logs.push(entry);
        Ok(())
    }

    async fn list(&self, filter: &LogFilter, pagination: Pagination) -> StoreResult<LogPage> {
        let state = self.read()?;
        let mut hits: Vec<&LogEntry> = state.logs.iter().filter(|e| filter.matches(e)).collect();
        hits.sort_by(|a, b| b.occurred_at().cmp(&a.occurred_at()));
        let total = hits.len() as u64;
        let entries = hits
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .cloned()
            .collect();
        Ok(LogPage::new(entries, total, pagination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use depot_core::Amount;
    use depot_parties::{ContactInfo, PartyDetails};
    use depot_products::NewGoods;
    use depot_purchasing::{NewDocument, NewLineItem};

    struct Fixture {
        store: InMemoryStore,
        supplier: SupplierId,
        goods_type: GoodsTypeId,
        goods: GoodsId,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let supplier = Supplier::new(
            SupplierId::new(),
            PartyDetails::new("Acme", ContactInfo::default(), None).unwrap(),
        );
        let supplier_id = supplier.id;
        store.insert_supplier(supplier).await.unwrap();

        let goods_type = GoodsType::new(GoodsTypeId::new(), "Drinks", None).unwrap();
        let type_id = goods_type.id;
        store.insert_goods_type(goods_type).await.unwrap();

        let goods = Goods::create(
            GoodsId::new(),
            NewGoods {
                code: "A1".into(),
                name: "Apple juice".into(),
                model: String::new(),
                unit: "box".into(),
                type_id,
                purchasing_price: Amount::ZERO,
                selling_price: Amount::ZERO,
                inventory_quantity: 0,
            },
        )
        .unwrap();
        let goods_id = goods.id;
        store.insert_goods(goods).await.unwrap();

        Fixture {
            store,
            supplier: supplier_id,
            goods_type: type_id,
            goods: goods_id,
        }
    }

    fn document(f: &Fixture, number: &str, goods: Option<GoodsId>) -> PurchaseDocument {
        PurchaseDocument::create(
            PurchaseListId::new(),
            NewDocument {
                number: number.into(),
                party_id: f.supplier,
                date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
                amount_payable: Amount::from_minor(30),
                state: SettlementState::Outstanding,
                remarks: None,
            },
            vec![NewLineItem {
                goods_id: goods,
                code: "A1".into(),
                name: "Apple juice".into(),
                model: String::new(),
                unit: "box".into(),
                price: Amount::from_minor(10),
                num: 3,
                type_id: f.goods_type,
            }],
            UserId::new(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_document_receives_stock() {
        let f = fixture().await;
        f.store.insert_document(document(&f, "PO-1", Some(f.goods))).await.unwrap();
        let goods = f.store.get_goods(f.goods).await.unwrap().unwrap();
        assert_eq!(goods.inventory_quantity, 3);
        assert_eq!(goods.last_purchasing_price, Amount::from_minor(10));
    }

    #[tokio::test]
    async fn duplicate_number_leaves_no_trace() {
        let f = fixture().await;
        f.store.insert_document(document(&f, "PO-1", Some(f.goods))).await.unwrap();
        let dup = document(&f, "PO-1", Some(f.goods));
        let dup_id = dup.header.id;
        let err = f.store.insert_document(dup).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(f.store.lines(dup_id).await.unwrap().is_empty());
        let goods = f.store.get_goods(f.goods).await.unwrap().unwrap();
        assert_eq!(goods.inventory_quantity, 3);
    }

    #[tokio::test]
    async fn unknown_goods_rolls_back_everything() {
        let f = fixture().await;
        let doc = document(&f, "PO-2", Some(GoodsId::new()));
        let id = doc.header.id;
        assert!(matches!(f.store.insert_document(doc).await, Err(StoreError::Constraint(_))));
        assert!(f.store.get_header(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn supplier_with_documents_cannot_be_deleted() {
        let f = fixture().await;
        f.store.insert_document(document(&f, "PO-1", None)).await.unwrap();
        assert!(matches!(f.store.delete_supplier(f.supplier).await, Err(StoreError::Constraint(_))));
    }

    #[tokio::test]
    async fn latest_number_respects_prefix() {
        let f = fixture().await;
        f.store.insert_document(document(&f, "JH202604010002", None)).await.unwrap();
        f.store.insert_document(document(&f, "JH202604010010", None)).await.unwrap();
        f.store.insert_document(document(&f, "JH202604020001", None)).await.unwrap();
        f.store.insert_document(document(&f, "JH202604019999X", None)).await.unwrap();
        let latest = HeaderStore::<PurchaseListId, SupplierId>::latest_number(&f.store, "JH20260401")
            .await
            .unwrap();
        assert_eq!(latest.as_deref(), Some("JH202604010010"));
    }

    #[tokio::test]
    async fn audit_list_is_newest_first_and_paginated() {
        let store = InMemoryStore::new();
        let base = chrono::Utc::now();
        for i in 0..5 {
            store
                .append(LogEntry::new(
                    depot_core::LogId::new(),
                    depot_audit::ActionKind::Select,
                    format!("q{i}"),
                    base + chrono::Duration::seconds(i),
                    None,
                ))
                .await
                .unwrap();
        }
        let page = store
            .list(&LogFilter::default(), Pagination { limit: 2, offset: 1 })
            .await
            .unwrap();
        let descriptions: Vec<_> = page.entries.iter().map(|e| e.description().to_string()).collect();
        assert_eq!(descriptions, vec!["q3", "q2"]);
        assert_eq!(page.total, 5);
        assert!(page.has_more);
    }
}
