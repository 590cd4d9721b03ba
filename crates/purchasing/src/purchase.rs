use serde::{Deserialize, Serialize};

use depot_core::{
    AggregateRoot, Amount, DomainError, DomainResult, GoodsId, GoodsTypeId, PurchaseListGoodsId,
    PurchaseListId, SupplierId, UserId,
};

use crate::header::{DocumentHeader, NewDocument};

/// Purchase document header.
pub type PurchaseList = DocumentHeader<PurchaseListId, SupplierId>;

/// One submitted line of a purchase document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    /// Catalog goods the line refers to, if any. Referenced goods receive stock.
    #[serde(default)]
    pub goods_id: Option<GoodsId>,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub unit: String,
    pub price: Amount,
    pub num: i64,
    pub type_id: GoodsTypeId,
}

/// Stored purchase line item, owned by its header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseListGoods {
    pub id: PurchaseListGoodsId,
    pub purchase_list_id: PurchaseListId,
    /// Position in the submitted sequence, starting at 1.
    pub line_no: u32,
    pub goods_id: Option<GoodsId>,
    pub code: String,
    pub name: String,
    pub model: String,
    pub unit: String,
    pub price: Amount,
    pub num: i64,
    pub total: Amount,
    pub type_id: GoodsTypeId,
}

depot_core::impl_entity!(PurchaseListGoods, PurchaseListGoodsId);

impl PurchaseListGoods {
    fn from_submitted(parent: PurchaseListId, line_no: u32, item: NewLineItem) -> DomainResult<Self> {
        let code = item.code.trim();
        if code.is_empty() {
            return Err(DomainError::validation(format!("line {line_no}: code must not be empty")));
        }
        if item.name.trim().is_empty() {
            return Err(DomainError::validation(format!("line {line_no}: name must not be empty")));
        }
        if item.num <= 0 {
            return Err(DomainError::validation(format!("line {line_no}: quantity must be positive")));
        }
        if item.price.is_negative() {
            return Err(DomainError::validation(format!("line {line_no}: price must not be negative")));
        }
        let total = item.price.times(item.num)?;

        Ok(Self {
            id: PurchaseListGoodsId::new(),
            purchase_list_id: parent,
            line_no,
            goods_id: item.goods_id,
            code: code.to_string(),
            name: item.name.trim().to_string(),
            model: item.model,
            unit: item.unit,
            price: item.price,
            num: item.num,
            total,
            type_id: item.type_id,
        })
    }
}

/// Aggregate: a purchase header together with the line items it owns.
///
/// Stores persist and delete the whole aggregate as one atomic unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseDocument {
    pub header: PurchaseList,
    pub lines: Vec<PurchaseListGoods>,
}

impl PurchaseDocument {
    /// Validate a submission and build the aggregate.
    ///
    /// Lines keep their submitted order and are numbered from 1.
    pub fn create(
        id: PurchaseListId,
        draft: NewDocument<SupplierId>,
        lines: Vec<NewLineItem>,
        created_by: UserId,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation("a purchase document needs at least one line item"));
        }
        let header = DocumentHeader::create(id, draft, created_by)?;
        let lines = lines
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                let line_no = u32::try_from(idx + 1)
                    .map_err(|_| DomainError::validation("too many line items"))?;
                PurchaseListGoods::from_submitted(id, line_no, item)
            })
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(Self { header, lines })
    }
}

impl AggregateRoot for PurchaseDocument {
    type Id = PurchaseListId;
    type Child = PurchaseListGoods;

    fn id(&self) -> &Self::Id {
        &self.header.id
    }

    fn children(&self) -> &[Self::Child] {
        &self.lines
    }
}
