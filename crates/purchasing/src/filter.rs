//! Document and line-item filters.
//!
//! Every supplied criterion must match; unset criteria match everything.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use depot_core::GoodsTypeId;

use crate::{DocumentHeader, PurchaseListGoods, SettlementState};

/// Filter over document headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFilter<P> {
    /// Substring of the document number.
    pub number: Option<String>,
    pub party_id: Option<P>,
    pub state: Option<SettlementState>,
    /// Inclusive.
    pub start: Option<NaiveDate>,
    /// Inclusive.
    pub end: Option<NaiveDate>,
}

impl<P> Default for DocumentFilter<P> {
    fn default() -> Self {
        Self {
            number: None,
            party_id: None,
            state: None,
            start: None,
            end: None,
        }
    }
}

impl<P: PartialEq> DocumentFilter<P> {
    pub fn matches<Id>(&self, header: &DocumentHeader<Id, P>) -> bool {
        if let Some(number) = self.number.as_deref().filter(|n| !n.is_empty()) {
            if !header.number.contains(number) {
                return false;
            }
        }
        if let Some(party) = &self.party_id {
            if &header.party_id != party {
                return false;
            }
        }
        if let Some(state) = self.state {
            if header.state != state {
                return false;
            }
        }
        if let Some(start) = self.start {
            if header.date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if header.date > end {
                return false;
            }
        }
        true
    }
}

/// Listing order: date descending, then number ascending.
pub fn sort_documents<Id, P>(headers: &mut [DocumentHeader<Id, P>]) {
    headers.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.number.cmp(&b.number)));
}

/// Filter over the line items of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemFilter {
    pub type_id: Option<GoodsTypeId>,
    /// Case-insensitive substring of either the code or the name.
    pub code_or_name: Option<String>,
}

impl LineItemFilter {
    pub fn matches(&self, line: &PurchaseListGoods) -> bool {
        if let Some(type_id) = self.type_id {
            if line.type_id != type_id {
                return false;
            }
        }
        if let Some(needle) = self.code_or_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            let needle = needle.to_lowercase();
            if !line.code.to_lowercase().contains(&needle) && !line.name.to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}
