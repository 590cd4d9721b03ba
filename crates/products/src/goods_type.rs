use serde::{Deserialize, Serialize};

use depot_core::{DomainError, DomainResult, GoodsTypeId};

/// Goods category. `parent_id` of `None` marks a root of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsType {
    pub id: GoodsTypeId,
    pub name: String,
    pub parent_id: Option<GoodsTypeId>,
}

depot_core::impl_entity!(GoodsType, GoodsTypeId);

impl GoodsType {
    pub fn new(id: GoodsTypeId, name: &str, parent_id: Option<GoodsTypeId>) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("goods type name must not be empty"));
        }
        if parent_id == Some(id) {
            return Err(DomainError::invariant("goods type cannot be its own parent"));
        }
        Ok(Self {
            id,
            name: name.to_string(),
            parent_id,
        })
    }
}
