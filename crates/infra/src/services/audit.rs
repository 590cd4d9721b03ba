use std::sync::Arc;

use tracing::{instrument, warn};

use depot_audit::{ActionKind, Actor, LogEntry, LogFilter, LogPage, Pagination};
use depot_auth::Principal;

use super::ServiceResult;
use crate::store::AuditStore;

/// Audit log writer and reader.
///
/// Writes never fail the caller: a store failure is logged at `warn` and
/// dropped, so business operations are not rolled back by a broken log.
#[derive(Clone)]
pub struct AuditLog {
    store: Arc<dyn AuditStore>,
}

impl AuditLog {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, kind: ActionKind, description: impl Into<String>, principal: Option<&Principal>) {
        let actor = principal.map(|p| Actor {
            user_id: p.user_id,
            username: p.username.clone(),
        });
        let entry = LogEntry::now(kind, description, actor);
        if let Err(err) = self.store.append(entry.clone()).await {
            warn!(
                error = %err,
                kind = %entry.kind(),
                description = entry.description(),
                "failed to write audit entry"
            );
        }
    }

    /// Query the log, newest first.
    #[instrument(skip(self, principal), fields(user = %principal.username), err)]
    pub async fn list(&self, principal: &Principal, filter: LogFilter, pagination: Pagination) -> ServiceResult<LogPage> {
        let page = self.store.list(&filter, pagination).await?;
        self.record(ActionKind::Select, "query system log", Some(principal)).await;
        Ok(page)
    }
}
