//! Goods catalog: goods types (a category tree) and goods with stock.
//!
//! Pure domain logic (no IO, no HTTP, no storage).

pub mod goods;
pub mod goods_type;

pub use goods::{Goods, NewGoods};
pub use goods_type::GoodsType;
