//! Purchase documents: listing, line items, statistics, save, delete and
//! settlement.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{Span, info, instrument};

use depot_audit::ActionKind;
use depot_auth::Principal;
use depot_core::{PurchaseListId, SupplierId};
use depot_purchasing::{
    DocumentFilter, DocumentKind, LineItemFilter, NewDocument, NewLineItem, PurchaseDocument,
    PurchaseList, PurchaseListGoods, PurchaseReportRow, ReportSource, SettlementState,
    flatten_report, next_number,
};

use super::{AuditLog, ServiceError, ServiceResult};
use crate::store::{CatalogStore, PurchaseStore, StoreError};

#[derive(Clone)]
pub struct PurchaseService {
    documents: Arc<dyn PurchaseStore>,
    catalog: Arc<dyn CatalogStore>,
    audit: AuditLog,
}

impl PurchaseService {
    pub fn new(documents: Arc<dyn PurchaseStore>, catalog: Arc<dyn CatalogStore>, audit: AuditLog) -> Self {
        Self {
            documents,
            catalog,
            audit,
        }
    }

    /// Headers matching every supplied criterion, newest first.
    #[instrument(skip(self, principal, filter), fields(user = %principal.username, result_count), err)]
    pub async fn list_documents(
        &self,
        principal: &Principal,
        filter: DocumentFilter<SupplierId>,
    ) -> ServiceResult<Vec<PurchaseList>> {
        let headers = self.documents.list_headers(&filter).await?;
        Span::current().record("result_count", headers.len());
        self.audit
            .record(ActionKind::Select, "query purchase documents", Some(principal))
            .await;
        Ok(headers)
    }

    /// Line items of one document in submitted order, optionally filtered.
    ///
    /// An unknown (or deleted) document has no lines.
    #[instrument(skip(self, principal), fields(user = %principal.username), err)]
    pub async fn list_line_items(
        &self,
        principal: &Principal,
        id: PurchaseListId,
        filter: &LineItemFilter,
    ) -> ServiceResult<Vec<PurchaseListGoods>> {
        let lines = self.documents.lines(id).await?;
        self.audit
            .record(ActionKind::Select, "query purchase document lines", Some(principal))
            .await;
        Ok(lines.into_iter().filter(|l| filter.matches(l)).collect())
    }

    /// Purchase statistics: documents dated within `[start, end]` joined with
    /// their matching lines, one row per line. Computed fresh on every call.
    #[instrument(skip(self, principal), fields(user = %principal.username, row_count), err)]
    pub async fn aggregate_for_report(
        &self,
        principal: &Principal,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        lines_filter: &LineItemFilter,
    ) -> ServiceResult<Vec<PurchaseReportRow>> {
        let headers = self
            .documents
            .list_headers(&DocumentFilter {
                start,
                end,
                ..Default::default()
            })
            .await?;

        let suppliers: HashMap<SupplierId, String> = self
            .catalog
            .list_suppliers()
            .await?
            .into_iter()
            .map(|s| (s.id, s.details.name))
            .collect();
        let type_names: HashMap<_, _> = self
            .catalog
            .list_goods_types()
            .await?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();

        let mut joined = Vec::with_capacity(headers.len());
        for header in &headers {
            let lines: Vec<PurchaseListGoods> = self
                .documents
                .lines(header.id)
                .await?
                .into_iter()
                .filter(|l| lines_filter.matches(l))
                .collect();
            joined.push((header, lines));
        }

        let rows = flatten_report(
            joined.iter().map(|(header, lines)| ReportSource {
                header,
                supplier_name: suppliers.get(&header.party_id).map(String::as_str).unwrap_or_default(),
                lines,
            }),
            &type_names,
        );
        Span::current().record("row_count", rows.len());
        self.audit
            .record(ActionKind::Select, "purchase statistics query", Some(principal))
            .await;
        Ok(rows)
    }

    /// Persist a new document (header, lines and stock receipt) atomically.
    ///
    /// The creating user is `principal`. A duplicate number, an unknown
    /// supplier or unknown goods fail validation and leave nothing behind.
    #[instrument(
        skip(self, principal, draft, lines),
        fields(user = %principal.username, number = %draft.number, line_count = lines.len()),
        err
    )]
    pub async fn save_document(
        &self,
        principal: &Principal,
        draft: NewDocument<SupplierId>,
        lines: Vec<NewLineItem>,
    ) -> ServiceResult<PurchaseList> {
        let document = PurchaseDocument::create(PurchaseListId::new(), draft, lines, principal.user_id)?;
        let header = document.header.clone();

        self.documents.insert_document(document).await.map_err(|err| match err {
            StoreError::Conflict(_) => {
                ServiceError::Validation(format!("purchase number '{}' already exists", header.number))
            }
            other => other.into(),
        })?;

        info!(id = %header.id, "purchase document saved");
        self.audit
            .record(ActionKind::Insert, format!("add purchase document {}", header.number), Some(principal))
            .await;
        Ok(header)
    }

    /// Delete a document and its lines. The business number is written to
    /// the audit log before the document is removed.
    #[instrument(skip(self, principal), fields(user = %principal.username), err)]
    pub async fn delete_document(&self, principal: &Principal, id: PurchaseListId) -> ServiceResult<()> {
        let header = self
            .documents
            .get_header(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("purchase document {id}")))?;

        self.audit
            .record(ActionKind::Delete, format!("delete purchase document {}", header.number), Some(principal))
            .await;

        if !self.documents.delete_document(id).await? {
            return Err(ServiceError::NotFound(format!("purchase document {id}")));
        }
        Ok(())
    }

    /// Set the settlement state. Amounts are not touched and applying the
    /// same state twice is a no-op.
    #[instrument(skip(self, principal), fields(user = %principal.username), err)]
    pub async fn update_state(
        &self,
        principal: &Principal,
        state: SettlementState,
        id: PurchaseListId,
    ) -> ServiceResult<PurchaseList> {
        if !self.documents.set_state(id, state).await? {
            return Err(ServiceError::NotFound(format!("purchase document {id}")));
        }
        let header = self
            .documents
            .get_header(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("purchase document {id}")))?;
        self.audit
            .record(
                ActionKind::Update,
                format!("set purchase document {} to {:?}", header.number, state),
                Some(principal),
            )
            .await;
        Ok(header)
    }

    /// Next free purchase number for `date`.
    #[instrument(skip(self), err)]
    pub async fn next_number(&self, date: NaiveDate) -> ServiceResult<String> {
        let prefix = DocumentKind::Purchase.day_prefix(date);
        let latest = self.documents.latest_number(&prefix).await?;
        Ok(next_number(DocumentKind::Purchase, date, latest.as_deref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{FailingAudit, Harness, SnapshottingAudit};
    use depot_audit::{LogFilter, Pagination};
    use depot_core::{Amount, GoodsId};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
    }

    #[tokio::test]
    async fn save_then_list_lines_returns_submission_in_order() {
        let h = Harness::new().await;
        let saved = h
            .services
            .purchases
            .save_document(&h.admin, h.draft("PO-0001", day(1)), vec![h.line("A1", 10, 3), h.line("B2", 5, 2)])
            .await
            .unwrap();

        let lines = h
            .services
            .purchases
            .list_line_items(&h.admin, saved.id, &LineItemFilter::default())
            .await
            .unwrap();
        let got: Vec<_> = lines.iter().map(|l| (l.code.as_str(), l.price.minor(), l.num, l.total.minor())).collect();
        assert_eq!(got, vec![("A1", 10, 3, 30), ("B2", 5, 2, 10)]);
        assert!(lines.iter().all(|l| l.total == l.price.times(l.num).unwrap()));
        assert_eq!(saved.created_by, h.admin.user_id);
    }

    #[tokio::test]
    async fn report_flattens_one_row_per_line() {
        let h = Harness::new().await;
        h.services
            .purchases
            .save_document(&h.admin, h.draft("PO-0001", day(10)), vec![h.line("A1", 10, 3), h.line("B2", 5, 2)])
            .await
            .unwrap();

        let rows = h
            .services
            .purchases
            .aggregate_for_report(&h.admin, Some(day(1)), Some(day(30)), &LineItemFilter::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].code.as_str(), rows[0].total), ("A1", Amount::from_minor(30)));
        assert_eq!((rows[1].code.as_str(), rows[1].total), ("B2", Amount::from_minor(10)));
        assert_eq!(rows[0].supplier_name, "Acme Trading");
        assert_eq!(rows[0].goods_type, "Beverages");

        let outside = h
            .services
            .purchases
            .aggregate_for_report(&h.admin, Some(day(11)), None, &LineItemFilter::default())
            .await
            .unwrap();
        assert!(outside.is_empty());
    }

    #[tokio::test]
    async fn date_bounds_are_inclusive() {
        let h = Harness::new().await;
        for (n, d) in [("a", 1), ("b", 5), ("c", 9)] {
            h.services
                .purchases
                .save_document(&h.admin, h.draft(n, day(d)), vec![h.line("A1", 1, 1)])
                .await
                .unwrap();
        }
        let hits = h
            .services
            .purchases
            .list_documents(
                &h.admin,
                DocumentFilter {
                    start: Some(day(1)),
                    end: Some(day(5)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let numbers: Vec<_> = hits.iter().map(|h| h.number.as_str()).collect();
        assert_eq!(numbers, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn delete_removes_document_and_logs_its_number() {
        let h = Harness::new().await;
        let saved = h
            .services
            .purchases
            .save_document(&h.admin, h.draft("PO-0042", day(2)), vec![h.line("A1", 1, 1)])
            .await
            .unwrap();

        h.services.purchases.delete_document(&h.admin, saved.id).await.unwrap();

        let lines = h
            .services
            .purchases
            .list_line_items(&h.admin, saved.id, &LineItemFilter::default())
            .await
            .unwrap();
        assert!(lines.is_empty());
        let all = h
            .services
            .purchases
            .list_documents(&h.admin, DocumentFilter::default())
            .await
            .unwrap();
        assert!(all.iter().all(|d| d.id != saved.id));

        let deletes = h
            .services
            .audit
            .list(
                &h.admin,
                LogFilter {
                    kind: Some(ActionKind::Delete),
                    ..Default::default()
                },
                Pagination::default(),
            )
            .await
            .unwrap();
        assert!(deletes.entries.iter().any(|e| e.description().contains("PO-0042")));
    }

    #[tokio::test]
    async fn delete_entry_is_written_while_the_document_still_exists() {
        let (h, audit) = Harness::with_audit_over(|store| Arc::new(SnapshottingAudit::new(store))).await;
        let saved = h
            .services
            .purchases
            .save_document(&h.admin, h.draft("PO-0077", day(3)), vec![h.line("A1", 1, 1)])
            .await
            .unwrap();

        h.services.purchases.delete_document(&h.admin, saved.id).await.unwrap();

        let snapshots = audit.snapshots.lock().unwrap();
        let (_, stored) = snapshots
            .iter()
            .find(|(description, _)| description.contains("PO-0077"))
            .expect("delete entry appended");
        assert!(stored.iter().any(|n| n == "PO-0077"));
        drop(snapshots);

        let remaining = h
            .services
            .purchases
            .list_documents(&h.admin, DocumentFilter::default())
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn delete_unknown_document_is_not_found() {
        let h = Harness::new().await;
        let err = h
            .services
            .purchases
            .delete_document(&h.admin, PurchaseListId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_state_is_idempotent_and_keeps_amounts() {
        let h = Harness::new().await;
        let saved = h
            .services
            .purchases
            .save_document(&h.admin, h.draft("PO-7", day(3)), vec![h.line("A1", 10, 4)])
            .await
            .unwrap();
        assert_eq!(saved.amount_paid, Amount::ZERO);

        let once = h
            .services
            .purchases
            .update_state(&h.admin, SettlementState::Settled, saved.id)
            .await
            .unwrap();
        let twice = h
            .services
            .purchases
            .update_state(&h.admin, SettlementState::Settled, saved.id)
            .await
            .unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.state, SettlementState::Settled);
        assert_eq!(twice.amount_paid, Amount::ZERO);

        let missing = h
            .services
            .purchases
            .update_state(&h.admin, SettlementState::Settled, PurchaseListId::new())
            .await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn duplicate_number_is_a_validation_failure() {
        let h = Harness::new().await;
        h.services
            .purchases
            .save_document(&h.admin, h.draft("PO-1", day(1)), vec![h.line("A1", 1, 1)])
            .await
            .unwrap();
        let err = h
            .services
            .purchases
            .save_document(&h.admin, h.draft("PO-1", day(2)), vec![h.line("B2", 1, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let docs = h
            .services
            .purchases
            .list_documents(&h.admin, DocumentFilter::default())
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn saving_receives_stock_for_catalog_goods() {
        let h = Harness::new().await;
        let goods = h.goods("A1").await;
        let mut line = h.line("A1", 250, 4);
        line.goods_id = Some(goods);
        h.services
            .purchases
            .save_document(&h.admin, h.draft("PO-9", day(4)), vec![line])
            .await
            .unwrap();
        let stocked = h.store.get_goods(goods).await.unwrap().unwrap();
        assert_eq!(stocked.inventory_quantity, 4);
        assert_eq!(stocked.last_purchasing_price, Amount::from_minor(250));
    }

    #[tokio::test]
    async fn unknown_goods_fails_without_partial_state() {
        let h = Harness::new().await;
        let mut line = h.line("A1", 1, 1);
        line.goods_id = Some(GoodsId::new());
        let err = h
            .services
            .purchases
            .save_document(&h.admin, h.draft("PO-X", day(4)), vec![line])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let docs = h
            .services
            .purchases
            .list_documents(&h.admin, DocumentFilter::default())
            .await
            .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn failing_audit_never_fails_the_operation() {
        let h = Harness::with_audit(Arc::new(FailingAudit)).await;
        let purchases = &h.services.purchases;
        let saved = purchases
            .save_document(&h.admin, h.draft("PO-1", day(1)), vec![h.line("A1", 1, 1)])
            .await
            .unwrap();
        purchases
            .update_state(&h.admin, SettlementState::Settled, saved.id)
            .await
            .unwrap();
        purchases.delete_document(&h.admin, saved.id).await.unwrap();
    }

    #[tokio::test]
    async fn next_number_continues_the_daily_sequence() {
        let h = Harness::new().await;
        assert_eq!(h.services.purchases.next_number(day(7)).await.unwrap(), "JH202606070001");
        h.services
            .purchases
            .save_document(&h.admin, h.draft("JH202606070001", day(7)), vec![h.line("A1", 1, 1)])
            .await
            .unwrap();
        assert_eq!(h.services.purchases.next_number(day(7)).await.unwrap(), "JH202606070002");
    }

    #[tokio::test]
    async fn hand_entered_numbers_do_not_break_the_sequence() {
        let h = Harness::new().await;
        for number in ["JH20260607-manual", "JH202606070001A", "JH2026060700099"] {
            h.services
                .purchases
                .save_document(&h.admin, h.draft(number, day(7)), vec![h.line("A1", 1, 1)])
                .await
                .unwrap();
        }
        assert_eq!(h.services.purchases.next_number(day(7)).await.unwrap(), "JH202606070001");

        h.services
            .purchases
            .save_document(&h.admin, h.draft("JH202606070001", day(7)), vec![h.line("A1", 1, 1)])
            .await
            .unwrap();
        assert_eq!(h.services.purchases.next_number(day(7)).await.unwrap(), "JH202606070002");
    }
}
