use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use depot_core::{Amount, CustomerId, GoodsId, GoodsTypeId, SupplierId};
use depot_parties::{ContactInfo, Customer, PartyDetails, Supplier};
use depot_products::{Goods, GoodsType};

use super::{PgStore, decode_error, map_sqlx_error};
use crate::store::{CatalogStore, StoreResult};

fn details_from_row(row: &PgRow) -> Result<PartyDetails, sqlx::Error> {
    Ok(PartyDetails {
        name: row.try_get("name")?,
        contact: ContactInfo {
            contact: row.try_get("contact")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
        },
        remarks: row.try_get("remarks")?,
    })
}

fn goods_type_from_row(row: &PgRow) -> Result<GoodsType, sqlx::Error> {
    Ok(GoodsType {
        id: GoodsTypeId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        parent_id: row.try_get::<Option<Uuid>, _>("parent_id")?.map(GoodsTypeId::from_uuid),
    })
}

pub(super) fn goods_from_row(row: &PgRow) -> Result<Goods, sqlx::Error> {
    Ok(Goods {
        id: GoodsId::from_uuid(row.try_get("id")?),
        code: row.try_get("code")?,
        name: row.try_get("name")?,
        model: row.try_get("model")?,
        unit: row.try_get("unit")?,
        type_id: GoodsTypeId::from_uuid(row.try_get("type_id")?),
        purchasing_price: Amount::from_minor(row.try_get("purchasing_price")?),
        last_purchasing_price: Amount::from_minor(row.try_get("last_purchasing_price")?),
        selling_price: Amount::from_minor(row.try_get("selling_price")?),
        inventory_quantity: row.try_get("inventory_quantity")?,
    })
}

pub(super) const GOODS_COLUMNS: &str = "id, code, name, model, unit, type_id, purchasing_price, \
     last_purchasing_price, selling_price, inventory_quantity";

const PARTY_COLUMNS: &str = "id, name, contact, phone, address, remarks";

// Suppliers and customers share one table layout.

async fn list_parties<T>(pool: &PgPool, table: &str, build: impl Fn(Uuid, PartyDetails) -> T) -> StoreResult<Vec<T>> {
    let rows = sqlx::query(&format!("SELECT {PARTY_COLUMNS} FROM {table} ORDER BY name"))
        .fetch_all(pool)
        .await
        .map_err(|e| map_sqlx_error("list_parties", e))?;
    rows.iter()
        .map(|row| Ok(build(row.try_get("id")?, details_from_row(row)?)))
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .map_err(|e| decode_error(table, e))
}

async fn get_party(pool: &PgPool, table: &str, id: &Uuid) -> StoreResult<Option<PartyDetails>> {
    let row = sqlx::query(&format!("SELECT {PARTY_COLUMNS} FROM {table} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| map_sqlx_error("get_party", e))?;
    row.as_ref()
        .map(details_from_row)
        .transpose()
        .map_err(|e| decode_error(table, e))
}

async fn insert_party(pool: &PgPool, table: &str, id: &Uuid, details: &PartyDetails) -> StoreResult<()> {
    sqlx::query(&format!(
        "INSERT INTO {table} ({PARTY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
    ))
    .bind(id)
    .bind(&details.name)
    .bind(&details.contact.contact)
    .bind(&details.contact.phone)
    .bind(&details.contact.address)
    .bind(&details.remarks)
    .execute(pool)
    .await
    .map_err(|e| map_sqlx_error("insert_party", e))?;
    Ok(())
}

async fn delete_row(pool: &PgPool, table: &str, id: &Uuid) -> StoreResult<bool> {
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("delete_row", e))?;
    Ok(result.rows_affected() > 0)
}

#[async_trait::async_trait]
impl CatalogStore for PgStore {
    #[instrument(skip(self), err)]
    async fn list_suppliers(&self) -> StoreResult<Vec<Supplier>> {
        list_parties(&self.pool, "suppliers", |id, d| Supplier::new(SupplierId::from_uuid(id), d)).await
    }

    #[instrument(skip(self), err)]
    async fn get_supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>> {
        let details = get_party(&self.pool, "suppliers", id.as_uuid()).await?;
        Ok(details.map(|d| Supplier::new(id, d)))
    }

    #[instrument(skip(self, supplier), fields(id = %supplier.id), err)]
    async fn insert_supplier(&self, supplier: Supplier) -> StoreResult<()> {
        insert_party(&self.pool, "suppliers", supplier.id.as_uuid(), &supplier.details).await
    }

    #[instrument(skip(self), err)]
    async fn delete_supplier(&self, id: SupplierId) -> StoreResult<bool> {
        delete_row(&self.pool, "suppliers", id.as_uuid()).await
    }

    #[instrument(skip(self), err)]
    async fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        list_parties(&self.pool, "customers", |id, d| Customer::new(CustomerId::from_uuid(id), d)).await
    }

    #[instrument(skip(self), err)]
    async fn get_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let details = get_party(&self.pool, "customers", id.as_uuid()).await?;
        Ok(details.map(|d| Customer::new(id, d)))
    }

    #[instrument(skip(self, customer), fields(id = %customer.id), err)]
    async fn insert_customer(&self, customer: Customer) -> StoreResult<()> {
        insert_party(&self.pool, "customers", customer.id.as_uuid(), &customer.details).await
    }

    #[instrument(skip(self), err)]
    async fn delete_customer(&self, id: CustomerId) -> StoreResult<bool> {
        delete_row(&self.pool, "customers", id.as_uuid()).await
    }

    #[instrument(skip(self), err)]
    async fn list_goods_types(&self) -> StoreResult<Vec<GoodsType>> {
        let rows = sqlx::query("SELECT id, name, parent_id FROM goods_types ORDER BY name")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_goods_types", e))?;
        rows.iter()
            .map(|r| goods_type_from_row(r).map_err(|e| decode_error("goods_types", e)))
            .collect()
    }

    #[instrument(skip(self, goods_type), fields(name = %goods_type.name), err)]
    async fn insert_goods_type(&self, goods_type: GoodsType) -> StoreResult<()> {
        sqlx::query("INSERT INTO goods_types (id, name, parent_id) VALUES ($1, $2, $3)")
            .bind(goods_type.id.as_uuid())
            .bind(&goods_type.name)
            .bind(goods_type.parent_id.map(|p| *p.as_uuid()))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_goods_type", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete_goods_type(&self, id: GoodsTypeId) -> StoreResult<bool> {
        delete_row(&self.pool, "goods_types", id.as_uuid()).await
    }

    #[instrument(skip(self), err)]
    async fn list_goods(&self) -> StoreResult<Vec<Goods>> {
        let rows = sqlx::query(&format!("SELECT {GOODS_COLUMNS} FROM goods ORDER BY code"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_goods", e))?;
        rows.iter()
            .map(|r| goods_from_row(r).map_err(|e| decode_error("goods", e)))
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn get_goods(&self, id: GoodsId) -> StoreResult<Option<Goods>> {
        let row = sqlx::query(&format!("SELECT {GOODS_COLUMNS} FROM goods WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_goods", e))?;
        row.as_ref()
            .map(goods_from_row)
            .transpose()
            .map_err(|e| decode_error("goods", e))
    }

    #[instrument(skip(self, goods), fields(code = %goods.code), err)]
    async fn insert_goods(&self, goods: Goods) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO goods (
                id, code, name, model, unit, type_id,
                purchasing_price, last_purchasing_price, selling_price, inventory_quantity
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(goods.id.as_uuid())
        .bind(&goods.code)
        .bind(&goods.name)
        .bind(&goods.model)
        .bind(&goods.unit)
        .bind(goods.type_id.as_uuid())
        .bind(goods.purchasing_price.minor())
        .bind(goods.last_purchasing_price.minor())
        .bind(goods.selling_price.minor())
        .bind(goods.inventory_quantity)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_goods", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete_goods(&self, id: GoodsId) -> StoreResult<bool> {
        delete_row(&self.pool, "goods", id.as_uuid()).await
    }
}
