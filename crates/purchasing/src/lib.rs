//! Purchasing domain module: purchase documents and returns.
//!
//! Document headers, owned line items, filters, report flattening and
//! document numbering, implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage).

pub mod filter;
pub mod header;
pub mod numbering;
pub mod purchase;
pub mod report;
pub mod returns;
pub mod state;

pub use filter::{DocumentFilter, LineItemFilter, sort_documents};
pub use header::{DocumentHeader, NewDocument};
pub use numbering::{DocumentKind, is_sequenced, next_number};
pub use purchase::{NewLineItem, PurchaseDocument, PurchaseList, PurchaseListGoods};
pub use report::{PurchaseReportRow, ReportSource, flatten_report};
pub use returns::{CustomerReturnList, ReturnList};
pub use state::SettlementState;
