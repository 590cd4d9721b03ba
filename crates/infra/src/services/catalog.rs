//! Suppliers, customers, goods types and goods.

use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;

use depot_audit::ActionKind;
use depot_auth::Principal;
use depot_core::{CustomerId, GoodsId, GoodsTypeId, SupplierId};
use depot_parties::{Customer, PartyDetails, Supplier};
use depot_products::{Goods, GoodsType, NewGoods};

use super::{AuditLog, ServiceError, ServiceResult};
use crate::store::{CatalogStore, StoreError};

/// Goods list filter. `code_or_name` is a case-insensitive substring match
/// against either field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GoodsQuery {
    #[serde(default)]
    pub code_or_name: Option<String>,
    #[serde(default)]
    pub type_id: Option<GoodsTypeId>,
}

impl GoodsQuery {
    pub fn matches(&self, goods: &Goods) -> bool {
        if self.type_id.is_some_and(|t| t != goods.type_id) {
            return false;
        }
        match self.code_or_name.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            None => true,
            Some(q) => {
                let q = q.to_lowercase();
                goods.code.to_lowercase().contains(&q) || goods.name.to_lowercase().contains(&q)
            }
        }
    }
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    audit: AuditLog,
}

fn conflict_as(what: String) -> impl FnOnce(StoreError) -> ServiceError {
    move |err| match err {
        StoreError::Conflict(_) => ServiceError::Validation(format!("{what} already exists")),
        other => other.into(),
    }
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, audit: AuditLog) -> Self {
        Self { store, audit }
    }

    pub async fn list_suppliers(&self, principal: &Principal) -> ServiceResult<Vec<Supplier>> {
        let suppliers = self.store.list_suppliers().await?;
        self.audit.record(ActionKind::Select, "query suppliers", Some(principal)).await;
        Ok(suppliers)
    }

    #[instrument(skip(self, principal, details), fields(user = %principal.username, name = %details.name), err)]
    pub async fn create_supplier(&self, principal: &Principal, details: PartyDetails) -> ServiceResult<Supplier> {
        let supplier = Supplier::new(SupplierId::new(), details);
        self.store
            .insert_supplier(supplier.clone())
            .await
            .map_err(conflict_as(format!("supplier '{}'", supplier.name())))?;
        self.audit
            .record(ActionKind::Insert, format!("add supplier {}", supplier.name()), Some(principal))
            .await;
        Ok(supplier)
    }

    /// Suppliers still referenced by documents cannot be deleted.
    #[instrument(skip(self, principal), fields(user = %principal.username), err)]
    pub async fn delete_supplier(&self, principal: &Principal, id: SupplierId) -> ServiceResult<()> {
        let supplier = self
            .store
            .get_supplier(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("supplier {id}")))?;
        if !self.store.delete_supplier(id).await? {
            return Err(ServiceError::NotFound(format!("supplier {id}")));
        }
        self.audit
            .record(ActionKind::Delete, format!("delete supplier {}", supplier.name()), Some(principal))
            .await;
        Ok(())
    }

    pub async fn list_customers(&self, principal: &Principal) -> ServiceResult<Vec<Customer>> {
        let customers = self.store.list_customers().await?;
        self.audit.record(ActionKind::Select, "query customers", Some(principal)).await;
        Ok(customers)
    }

    #[instrument(skip(self, principal, details), fields(user = %principal.username, name = %details.name), err)]
    pub async fn create_customer(&self, principal: &Principal, details: PartyDetails) -> ServiceResult<Customer> {
        let customer = Customer::new(CustomerId::new(), details);
        self.store
            .insert_customer(customer.clone())
            .await
            .map_err(conflict_as(format!("customer '{}'", customer.name())))?;
        self.audit
            .record(ActionKind::Insert, format!("add customer {}", customer.name()), Some(principal))
            .await;
        Ok(customer)
    }

    #[instrument(skip(self, principal), fields(user = %principal.username), err)]
    pub async fn delete_customer(&self, principal: &Principal, id: CustomerId) -> ServiceResult<()> {
        let customer = self
            .store
            .get_customer(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("customer {id}")))?;
        if !self.store.delete_customer(id).await? {
            return Err(ServiceError::NotFound(format!("customer {id}")));
        }
        self.audit
            .record(ActionKind::Delete, format!("delete customer {}", customer.name()), Some(principal))
            .await;
        Ok(())
    }

    pub async fn list_goods_types(&self, principal: &Principal) -> ServiceResult<Vec<GoodsType>> {
        let types = self.store.list_goods_types().await?;
        self.audit.record(ActionKind::Select, "query goods types", Some(principal)).await;
        Ok(types)
    }

    /// An unknown parent is a validation failure.
    #[instrument(skip(self, principal), fields(user = %principal.username), err)]
    pub async fn create_goods_type(
        &self,
        principal: &Principal,
        name: &str,
        parent_id: Option<GoodsTypeId>,
    ) -> ServiceResult<GoodsType> {
        let goods_type = GoodsType::new(GoodsTypeId::new(), name, parent_id)?;
        self.store
            .insert_goods_type(goods_type.clone())
            .await
            .map_err(conflict_as(format!("goods type '{}'", goods_type.name)))?;
        self.audit
            .record(ActionKind::Insert, format!("add goods type {}", goods_type.name), Some(principal))
            .await;
        Ok(goods_type)
    }

    #[instrument(skip(self, principal), fields(user = %principal.username), err)]
    pub async fn delete_goods_type(&self, principal: &Principal, id: GoodsTypeId) -> ServiceResult<()> {
        if !self.store.delete_goods_type(id).await? {
            return Err(ServiceError::NotFound(format!("goods type {id}")));
        }
        self.audit
            .record(ActionKind::Delete, format!("delete goods type {id}"), Some(principal))
            .await;
        Ok(())
    }

    /// Goods matching `query`, ordered by code.
    pub async fn list_goods(&self, principal: &Principal, query: &GoodsQuery) -> ServiceResult<Vec<Goods>> {
        let goods: Vec<Goods> = self
            .store
            .list_goods()
            .await?
            .into_iter()
            .filter(|g| query.matches(g))
            .collect();
        self.audit.record(ActionKind::Select, "query goods", Some(principal)).await;
        Ok(goods)
    }

    #[instrument(skip(self, principal, input), fields(user = %principal.username, code = %input.code), err)]
    pub async fn create_goods(&self, principal: &Principal, input: NewGoods) -> ServiceResult<Goods> {
        let goods = Goods::create(GoodsId::new(), input)?;
        self.store
            .insert_goods(goods.clone())
            .await
            .map_err(conflict_as(format!("goods code '{}'", goods.code)))?;
        self.audit
            .record(ActionKind::Insert, format!("add goods {} {}", goods.code, goods.name), Some(principal))
            .await;
        Ok(goods)
    }

    /// Purchase lines that referenced the goods keep their copied fields.
    #[instrument(skip(self, principal), fields(user = %principal.username), err)]
    pub async fn delete_goods(&self, principal: &Principal, id: GoodsId) -> ServiceResult<()> {
        let goods = self
            .store
            .get_goods(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("goods {id}")))?;
        if !self.store.delete_goods(id).await? {
            return Err(ServiceError::NotFound(format!("goods {id}")));
        }
        self.audit
            .record(ActionKind::Delete, format!("delete goods {}", goods.code), Some(principal))
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::Harness;
    use depot_core::Amount;
    use depot_parties::ContactInfo;

    fn new_goods(code: &str, name: &str, type_id: GoodsTypeId) -> NewGoods {
        NewGoods {
            code: code.into(),
            name: name.into(),
            model: String::new(),
            unit: "box".into(),
            type_id,
            purchasing_price: Amount::from_minor(100),
            selling_price: Amount::from_minor(150),
            inventory_quantity: 0,
        }
    }

    #[tokio::test]
    async fn goods_query_matches_code_or_name_ignoring_case() {
        let h = Harness::new().await;
        let catalog = &h.services.catalog;
        catalog.create_goods(&h.admin, new_goods("TEA-01", "Green Tea", h.goods_type)).await.unwrap();
        catalog.create_goods(&h.admin, new_goods("COF-01", "Coffee", h.goods_type)).await.unwrap();

        let by_name = GoodsQuery {
            code_or_name: Some("green".into()),
            ..Default::default()
        };
        let hits = catalog.list_goods(&h.admin, &by_name).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "TEA-01");

        let by_code = GoodsQuery {
            code_or_name: Some("cof".into()),
            type_id: Some(h.goods_type),
        };
        assert_eq!(catalog.list_goods(&h.admin, &by_code).await.unwrap()[0].name, "Coffee");

        let other_type = GoodsQuery {
            type_id: Some(GoodsTypeId::new()),
            ..Default::default()
        };
        assert!(catalog.list_goods(&h.admin, &other_type).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_goods_code_fails_validation() {
        let h = Harness::new().await;
        let catalog = &h.services.catalog;
        catalog.create_goods(&h.admin, new_goods("X1", "One", h.goods_type)).await.unwrap();
        let err = catalog.create_goods(&h.admin, new_goods("X1", "Two", h.goods_type)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn supplier_with_documents_cannot_be_deleted() {
        let h = Harness::new().await;
        let date = chrono::NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        h.services
            .purchases
            .save_document(&h.admin, h.draft("PO-1", date), vec![h.line("A1", 1, 1)])
            .await
            .unwrap();

        let err = h.services.catalog.delete_supplier(&h.admin, h.supplier).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let fresh = h
            .services
            .catalog
            .create_supplier(
                &h.admin,
                PartyDetails::new("Unused Ltd", ContactInfo::default(), None).unwrap(),
            )
            .await
            .unwrap();
        h.services.catalog.delete_supplier(&h.admin, fresh.id).await.unwrap();
        assert!(matches!(
            h.services.catalog.delete_supplier(&h.admin, fresh.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn goods_type_parent_must_exist() {
        let h = Harness::new().await;
        let err = h
            .services
            .catalog
            .create_goods_type(&h.admin, "Juice", Some(GoodsTypeId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let juice = h
            .services
            .catalog
            .create_goods_type(&h.admin, "Juice", Some(h.goods_type))
            .await
            .unwrap();
        assert_eq!(juice.parent_id, Some(h.goods_type));
    }
}
