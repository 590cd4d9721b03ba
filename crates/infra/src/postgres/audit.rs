use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};
use tracing::instrument;
use uuid::Uuid;

use depot_audit::{ActionKind, Actor, LogEntry, LogFilter, LogPage, Pagination};
use depot_core::{LogId, UserId};

use super::{PgStore, decode_error, map_sqlx_error};
use crate::store::{AuditStore, StoreResult};

fn entry_from_row(row: &PgRow) -> StoreResult<LogEntry> {
    let decode = |e: sqlx::Error| decode_error("log", e);
    let kind: String = row.try_get("kind").map_err(decode)?;
    let kind: ActionKind = kind.parse().map_err(|e| decode_error("log", e))?;
    let user_id: Option<Uuid> = row.try_get("user_id").map_err(decode)?;
    let username: Option<String> = row.try_get("username").map_err(decode)?;
    let actor = match (user_id, username) {
        (Some(id), Some(username)) => Some(Actor {
            user_id: UserId::from_uuid(id),
            username,
        }),
        _ => None,
    };
    Ok(LogEntry::new(
        LogId::from_uuid(row.try_get("id").map_err(decode)?),
        kind,
        row.try_get::<String, _>("description").map_err(decode)?,
        row.try_get("occurred_at").map_err(decode)?,
        actor,
    ))
}

fn push_conditions(qb: &mut QueryBuilder<'_, Postgres>, filter: &LogFilter) {
    qb.push(" WHERE TRUE");
    if let Some(kind) = filter.kind {
        qb.push(" AND kind = ").push_bind(kind.as_str());
    }
    if let Some(username) = &filter.username {
        qb.push(" AND username = ").push_bind(username.clone());
    }
    if let Some(after) = filter.occurred_after {
        qb.push(" AND occurred_at >= ").push_bind(after);
    }
    if let Some(before) = filter.occurred_before {
        qb.push(" AND occurred_at <= ").push_bind(before);
    }
}

#[async_trait::async_trait]
impl AuditStore for PgStore {
    #[instrument(skip(self, entry), fields(kind = %entry.kind()), err)]
    async fn append(&self, entry: LogEntry) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO logs (id, kind, description, occurred_at, user_id, username)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id().as_uuid())
        .bind(entry.kind().as_str())
        .bind(entry.description())
        .bind(entry.occurred_at())
        .bind(entry.actor().map(|a| *a.user_id.as_uuid()))
        .bind(entry.actor().map(|a| a.username.as_str()))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("append_log", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list(&self, filter: &LogFilter, pagination: Pagination) -> StoreResult<LogPage> {
        let mut count: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT count(*) AS total FROM logs");
        push_conditions(&mut count, filter);
        let total: i64 = count
            .build()
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_logs", e))?
            .try_get("total")
            .map_err(|e| decode_error("log count", e))?;

        let mut select: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT id, kind, description, occurred_at, user_id, username FROM logs");
        push_conditions(&mut select, filter);
        select
            .push(" ORDER BY occurred_at DESC LIMIT ")
            .push_bind(i64::from(pagination.limit))
            .push(" OFFSET ")
            .push_bind(i64::from(pagination.offset));
        let rows = select
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_logs", e))?;

        let entries = rows.iter().map(entry_from_row).collect::<StoreResult<Vec<_>>>()?;
        Ok(LogPage::new(entries, u64::try_from(total).unwrap_or_default(), pagination))
    }
}
