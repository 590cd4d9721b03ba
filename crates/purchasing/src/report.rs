//! Purchase statistics: documents joined with their line items and
//! flattened to one row per line.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use depot_core::{Amount, GoodsTypeId};

use crate::{PurchaseList, PurchaseListGoods};

/// One flattened report row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseReportRow {
    pub number: String,
    pub date: NaiveDate,
    pub supplier_name: String,
    pub code: String,
    pub name: String,
    pub model: String,
    pub goods_type: String,
    pub unit: String,
    pub price: Amount,
    pub num: i64,
    pub total: Amount,
}

/// A document header with its supplier name and its (already filtered) lines.
#[derive(Debug, Clone)]
pub struct ReportSource<'a> {
    pub header: &'a PurchaseList,
    pub supplier_name: &'a str,
    pub lines: &'a [PurchaseListGoods],
}

/// Flatten documents into rows, preserving document order and line order.
///
/// Goods types missing from `type_names` are reported by id.
pub fn flatten_report<'a, I>(sources: I, type_names: &HashMap<GoodsTypeId, String>) -> Vec<PurchaseReportRow>
where
    I: IntoIterator<Item = ReportSource<'a>>,
{
    sources
        .into_iter()
        .flat_map(|src| {
            src.lines.iter().map(move |line| PurchaseReportRow {
                number: src.header.number.clone(),
                date: src.header.date,
                supplier_name: src.supplier_name.to_string(),
                code: line.code.clone(),
                name: line.name.clone(),
                model: line.model.clone(),
                goods_type: type_names
                    .get(&line.type_id)
                    .cloned()
                    .unwrap_or_else(|| line.type_id.to_string()),
                unit: line.unit.clone(),
                price: line.price,
                num: line.num,
                total: line.total,
            })
        })
        .collect()
}
