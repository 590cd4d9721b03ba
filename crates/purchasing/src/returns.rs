//! Return documents.
//!
//! Supplier returns send goods back to a supplier; customer returns take
//! goods back from a customer. Both are header-only documents sharing the
//! purchase header contract, where `Settled` means returned.

use depot_core::{CustomerId, CustomerReturnListId, ReturnListId, SupplierId};

use crate::header::DocumentHeader;

/// Supplier return header.
pub type ReturnList = DocumentHeader<ReturnListId, SupplierId>;

/// Customer return header.
pub type CustomerReturnList = DocumentHeader<CustomerReturnListId, CustomerId>;
