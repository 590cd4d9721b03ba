//! Document headers (purchases, supplier returns, customer returns) and
//! purchase lines.

use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};
use tracing::{Span, instrument};
use uuid::Uuid;

use depot_core::{
    Amount, CustomerId, CustomerReturnListId, GoodsId, GoodsTypeId, PurchaseListGoodsId,
    PurchaseListId, ReturnListId, SupplierId, UserId,
};
use depot_purchasing::numbering::SEQUENCE_DIGITS;
use depot_purchasing::{
    DocumentFilter, DocumentHeader, PurchaseDocument, PurchaseListGoods, SettlementState,
};

use super::catalog::{GOODS_COLUMNS, goods_from_row};
use super::{PgStore, decode_error, map_sqlx_error};
use crate::store::{HeaderStore, PurchaseStore, ReturnStore, StoreError, StoreResult};

/// Column layout of one header table.
struct HeaderTable {
    table: &'static str,
    party_column: &'static str,
    date_column: &'static str,
}

const PURCHASES: HeaderTable = HeaderTable {
    table: "purchase_lists",
    party_column: "supplier_id",
    date_column: "purchase_date",
};

const RETURNS: HeaderTable = HeaderTable {
    table: "return_lists",
    party_column: "supplier_id",
    date_column: "return_date",
};

const CUSTOMER_RETURNS: HeaderTable = HeaderTable {
    table: "customer_return_lists",
    party_column: "customer_id",
    date_column: "return_date",
};

impl HeaderTable {
    fn select(&self) -> String {
        format!(
            "SELECT id, number, {} AS party_id, {} AS doc_date, amount_payable, amount_paid, \
             state, created_by, remarks FROM {}",
            self.party_column, self.date_column, self.table
        )
    }
}

fn header_from_row<Id, P>(row: &PgRow) -> StoreResult<DocumentHeader<Id, P>>
where
    Id: From<Uuid>,
    P: From<Uuid>,
{
    let decode = |e: sqlx::Error| decode_error("document header", e);
    let state: i16 = row.try_get("state").map_err(decode)?;
    Ok(DocumentHeader {
        id: Id::from(row.try_get::<Uuid, _>("id").map_err(decode)?),
        number: row.try_get("number").map_err(decode)?,
        party_id: P::from(row.try_get::<Uuid, _>("party_id").map_err(decode)?),
        date: row.try_get("doc_date").map_err(decode)?,
        amount_payable: Amount::from_minor(row.try_get("amount_payable").map_err(decode)?),
        amount_paid: Amount::from_minor(row.try_get("amount_paid").map_err(decode)?),
        state: SettlementState::from_code(state).map_err(|e| decode_error("document header", e))?,
        created_by: UserId::from_uuid(row.try_get("created_by").map_err(decode)?),
        remarks: row.try_get("remarks").map_err(decode)?,
    })
}

impl PgStore {
    async fn list_headers_in<Id, P>(
        &self,
        table: &HeaderTable,
        filter: &DocumentFilter<P>,
    ) -> StoreResult<Vec<DocumentHeader<Id, P>>>
    where
        Id: From<Uuid>,
        P: From<Uuid> + AsRef<Uuid>,
    {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(table.select());
        qb.push(" WHERE TRUE");
        if let Some(number) = filter.number.as_deref().filter(|n| !n.is_empty()) {
            qb.push(" AND strpos(number, ").push_bind(number.to_string()).push(") > 0");
        }
        if let Some(party) = &filter.party_id {
            qb.push(format!(" AND {} = ", table.party_column))
                .push_bind(*party.as_ref());
        }
        if let Some(state) = filter.state {
            qb.push(" AND state = ").push_bind(state.code());
        }
        if let Some(start) = filter.start {
            qb.push(format!(" AND {} >= ", table.date_column)).push_bind(start);
        }
        if let Some(end) = filter.end {
            qb.push(format!(" AND {} <= ", table.date_column)).push_bind(end);
        }
        qb.push(format!(" ORDER BY {} DESC, number ASC", table.date_column));

        let rows = qb
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_headers", e))?;
        Span::current().record("row_count", rows.len());
        rows.iter().map(header_from_row).collect()
    }

    async fn get_header_in<Id, P>(&self, table: &HeaderTable, id: &Uuid) -> StoreResult<Option<DocumentHeader<Id, P>>>
    where
        Id: From<Uuid>,
        P: From<Uuid>,
    {
        let row = sqlx::query(&format!("{} WHERE id = $1", table.select()))
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_header", e))?;
        row.as_ref().map(header_from_row).transpose()
    }

    async fn set_state_in(&self, table: &HeaderTable, id: &Uuid, state: SettlementState) -> StoreResult<bool> {
        let result = sqlx::query(&format!("UPDATE {} SET state = $2 WHERE id = $1", table.table))
            .bind(id)
            .bind(state.code())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_state", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn latest_number_in(&self, table: &HeaderTable, prefix: &str) -> StoreResult<Option<String>> {
        let row = sqlx::query(&format!(
            "SELECT max(number) AS latest FROM {} WHERE number ~ ('^' || $1 || '[0-9]{{{}}}$')",
            table.table, SEQUENCE_DIGITS
        ))
        .bind(prefix)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("latest_number", e))?;
        row.try_get("latest").map_err(|e| decode_error("latest number", e))
    }

    async fn insert_header_in<Id, P>(
        &self,
        table: &HeaderTable,
        executor: &mut sqlx::PgConnection,
        header: &DocumentHeader<Id, P>,
    ) -> StoreResult<()>
    where
        Id: AsRef<Uuid>,
        P: AsRef<Uuid>,
    {
        sqlx::query(&format!(
            "INSERT INTO {} (id, number, {}, {}, amount_payable, amount_paid, state, created_by, remarks) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            table.table, table.party_column, table.date_column
        ))
        .bind(header.id.as_ref())
        .bind(&header.number)
        .bind(header.party_id.as_ref())
        .bind(header.date)
        .bind(header.amount_payable.minor())
        .bind(header.amount_paid.minor())
        .bind(header.state.code())
        .bind(header.created_by.as_uuid())
        .bind(&header.remarks)
        .execute(executor)
        .await
        .map_err(|e| map_sqlx_error("insert_header", e))?;
        Ok(())
    }
}

fn line_from_row(row: &PgRow) -> Result<PurchaseListGoods, sqlx::Error> {
    let line_no: i32 = row.try_get("line_no")?;
    Ok(PurchaseListGoods {
        id: PurchaseListGoodsId::from_uuid(row.try_get("id")?),
        purchase_list_id: PurchaseListId::from_uuid(row.try_get("purchase_list_id")?),
        line_no: u32::try_from(line_no).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        goods_id: row.try_get::<Option<Uuid>, _>("goods_id")?.map(GoodsId::from_uuid),
        code: row.try_get("code")?,
        name: row.try_get("name")?,
        model: row.try_get("model")?,
        unit: row.try_get("unit")?,
        price: Amount::from_minor(row.try_get("price")?),
        num: row.try_get("num")?,
        total: Amount::from_minor(row.try_get("total")?),
        type_id: GoodsTypeId::from_uuid(row.try_get("type_id")?),
    })
}

macro_rules! header_store {
    ($id:ty, $party:ty, $table:ident) => {
        #[async_trait::async_trait]
        impl HeaderStore<$id, $party> for PgStore {
            #[instrument(skip(self, filter), fields(table = $table.table, row_count), err)]
            async fn list_headers(
                &self,
                filter: &DocumentFilter<$party>,
            ) -> StoreResult<Vec<DocumentHeader<$id, $party>>> {
                self.list_headers_in(&$table, filter).await
            }

            #[instrument(skip(self), fields(table = $table.table), err)]
            async fn get_header(&self, id: $id) -> StoreResult<Option<DocumentHeader<$id, $party>>> {
                self.get_header_in(&$table, id.as_uuid()).await
            }

            #[instrument(skip(self), fields(table = $table.table), err)]
            async fn set_state(&self, id: $id, state: SettlementState) -> StoreResult<bool> {
                self.set_state_in(&$table, id.as_uuid(), state).await
            }

            #[instrument(skip(self), fields(table = $table.table), err)]
            async fn latest_number(&self, prefix: &str) -> StoreResult<Option<String>> {
                self.latest_number_in(&$table, prefix).await
            }
        }
    };
}

header_store!(PurchaseListId, SupplierId, PURCHASES);
header_store!(ReturnListId, SupplierId, RETURNS);
header_store!(CustomerReturnListId, CustomerId, CUSTOMER_RETURNS);

macro_rules! return_store {
    ($id:ty, $party:ty, $table:ident) => {
        #[async_trait::async_trait]
        impl ReturnStore<$id, $party> for PgStore {
            #[instrument(skip(self, header), fields(table = $table.table, number = %header.number), err)]
            async fn insert_header(&self, header: DocumentHeader<$id, $party>) -> StoreResult<()> {
                let mut conn = self
                    .pool
                    .acquire()
                    .await
                    .map_err(|e| map_sqlx_error("acquire_connection", e))?;
                self.insert_header_in(&$table, &mut conn, &header).await
            }

            #[instrument(skip(self), fields(table = $table.table), err)]
            async fn delete_header(&self, id: $id) -> StoreResult<bool> {
                let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", $table.table))
                    .bind(id.as_uuid())
                    .execute(&*self.pool)
                    .await
                    .map_err(|e| map_sqlx_error("delete_header", e))?;
                Ok(result.rows_affected() > 0)
            }
        }
    };
}

return_store!(ReturnListId, SupplierId, RETURNS);
return_store!(CustomerReturnListId, CustomerId, CUSTOMER_RETURNS);

#[async_trait::async_trait]
impl PurchaseStore for PgStore {
    /// Header, lines and stock receipt in one transaction.
    ///
    /// Referenced goods rows are locked (`FOR UPDATE`) before their stock and
    /// prices are recomputed, so concurrent receipts of the same goods
    /// serialize instead of losing updates.
    #[instrument(
        skip(self, document),
        fields(number = %document.header.number, line_count = document.lines.len()),
        err
    )]
    async fn insert_document(&self, document: PurchaseDocument) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        self.insert_header_in(&PURCHASES, &mut tx, &document.header).await?;

        for line in &document.lines {
            sqlx::query(
                r#"
                INSERT INTO purchase_list_goods (
                    id, purchase_list_id, line_no, goods_id, code, name, model, unit,
                    price, num, total, type_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(line.id.as_uuid())
            .bind(line.purchase_list_id.as_uuid())
            .bind(i32::try_from(line.line_no).map_err(|_| StoreError::Constraint("line number out of range".into()))?)
            .bind(line.goods_id.map(|g| *g.as_uuid()))
            .bind(&line.code)
            .bind(&line.name)
            .bind(&line.model)
            .bind(&line.unit)
            .bind(line.price.minor())
            .bind(line.num)
            .bind(line.total.minor())
            .bind(line.type_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_line", e))?;

            let Some(goods_id) = line.goods_id else { continue };
            let row = sqlx::query(&format!("SELECT {GOODS_COLUMNS} FROM goods WHERE id = $1 FOR UPDATE"))
                .bind(goods_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("lock_goods", e))?
                .ok_or_else(|| StoreError::Constraint(format!("goods {goods_id} does not exist")))?;
            let mut goods = goods_from_row(&row).map_err(|e| decode_error("goods", e))?;
            goods
                .receive(line.num, line.price)
                .map_err(|e| StoreError::Constraint(e.to_string()))?;

            sqlx::query(
                r#"
                UPDATE goods
                SET inventory_quantity = $2, purchasing_price = $3, last_purchasing_price = $4
                WHERE id = $1
                "#,
            )
            .bind(goods.id.as_uuid())
            .bind(goods.inventory_quantity)
            .bind(goods.purchasing_price.minor())
            .bind(goods.last_purchasing_price.minor())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("receive_stock", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), err)]
    async fn lines(&self, id: PurchaseListId) -> StoreResult<Vec<PurchaseListGoods>> {
        let rows = sqlx::query(
            r#"
            SELECT id, purchase_list_id, line_no, goods_id, code, name, model, unit,
                   price, num, total, type_id
            FROM purchase_list_goods
            WHERE purchase_list_id = $1
            ORDER BY line_no ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("lines", e))?;
        rows.iter()
            .map(|r| line_from_row(r).map_err(|e| decode_error("purchase line", e)))
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn delete_document(&self, id: PurchaseListId) -> StoreResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("DELETE FROM purchase_list_goods WHERE purchase_list_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_lines", e))?;
        let result = sqlx::query("DELETE FROM purchase_lists WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_header", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(result.rows_affected() > 0)
    }
}
