//! Supplier returns and customer returns.
//!
//! Both kinds share one service; only the id/party types, the number
//! prefix and the wording of audit entries differ.

use std::fmt::{Debug, Display};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::instrument;

use depot_audit::ActionKind;
use depot_auth::Principal;
use depot_core::{CustomerId, CustomerReturnListId, ReturnListId, SupplierId};
use depot_purchasing::{DocumentFilter, DocumentHeader, DocumentKind, NewDocument, SettlementState, next_number};

use super::{AuditLog, ServiceError, ServiceResult};
use crate::store::{ReturnStore, StoreError};

pub struct ReturnService<Id, P> {
    store: Arc<dyn ReturnStore<Id, P>>,
    audit: AuditLog,
    kind: DocumentKind,
    label: &'static str,
}

impl<Id, P> Clone for ReturnService<Id, P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            audit: self.audit.clone(),
            kind: self.kind,
            label: self.label,
        }
    }
}

pub type SupplierReturnService = ReturnService<ReturnListId, SupplierId>;
pub type CustomerReturnService = ReturnService<CustomerReturnListId, CustomerId>;

impl SupplierReturnService {
    pub fn supplier(store: Arc<dyn ReturnStore<ReturnListId, SupplierId>>, audit: AuditLog) -> Self {
        Self {
            store,
            audit,
            kind: DocumentKind::Return,
            label: "return document",
        }
    }
}

impl CustomerReturnService {
    pub fn customer(store: Arc<dyn ReturnStore<CustomerReturnListId, CustomerId>>, audit: AuditLog) -> Self {
        Self {
            store,
            audit,
            kind: DocumentKind::CustomerReturn,
            label: "customer return document",
        }
    }
}

impl<Id, P> ReturnService<Id, P>
where
    Id: Copy + Default + Display + Debug + Send + Sync + 'static,
    P: Copy + PartialEq + Debug + Send + Sync + 'static,
{
    #[instrument(skip(self, principal, filter), fields(user = %principal.username, kind = ?self.kind), err)]
    pub async fn list_documents(
        &self,
        principal: &Principal,
        filter: DocumentFilter<P>,
    ) -> ServiceResult<Vec<DocumentHeader<Id, P>>> {
        let headers = self.store.list_headers(&filter).await?;
        self.audit
            .record(ActionKind::Select, format!("query {}s", self.label), Some(principal))
            .await;
        Ok(headers)
    }

    #[instrument(skip(self, principal, draft), fields(user = %principal.username, number = %draft.number), err)]
    pub async fn save_document(
        &self,
        principal: &Principal,
        draft: NewDocument<P>,
    ) -> ServiceResult<DocumentHeader<Id, P>> {
        let header = DocumentHeader::create(Id::default(), draft, principal.user_id)?;
        self.store
            .insert_header(header.clone())
            .await
            .map_err(|err| match err {
                StoreError::Conflict(_) => {
                    ServiceError::Validation(format!("{} number '{}' already exists", self.label, header.number))
                }
                other => other.into(),
            })?;
        self.audit
            .record(ActionKind::Insert, format!("add {} {}", self.label, header.number), Some(principal))
            .await;
        Ok(header)
    }

    /// The number is logged before the document is removed.
    #[instrument(skip(self, principal), fields(user = %principal.username), err)]
    pub async fn delete_document(&self, principal: &Principal, id: Id) -> ServiceResult<()> {
        let header = self
            .store
            .get_header(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{} {id}", self.label)))?;
        self.audit
            .record(ActionKind::Delete, format!("delete {} {}", self.label, header.number), Some(principal))
            .await;
        if !self.store.delete_header(id).await? {
            return Err(ServiceError::NotFound(format!("{} {id}", self.label)));
        }
        Ok(())
    }

    #[instrument(skip(self, principal), fields(user = %principal.username), err)]
    pub async fn update_state(
        &self,
        principal: &Principal,
        state: SettlementState,
        id: Id,
    ) -> ServiceResult<DocumentHeader<Id, P>> {
        if !self.store.set_state(id, state).await? {
            return Err(ServiceError::NotFound(format!("{} {id}", self.label)));
        }
        let header = self
            .store
            .get_header(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{} {id}", self.label)))?;
        self.audit
            .record(
                ActionKind::Update,
                format!("set {} {} to {:?}", self.label, header.number, state),
                Some(principal),
            )
            .await;
        Ok(header)
    }

    #[instrument(skip(self), err)]
    pub async fn next_number(&self, date: NaiveDate) -> ServiceResult<String> {
        let latest = self.store.latest_number(&self.kind.day_prefix(date)).await?;
        Ok(next_number(self.kind, date, latest.as_deref())?)
    }
}
