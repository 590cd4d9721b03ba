//! Parties domain module (customers and suppliers).
//!
//! Plain validated records referenced by purchase and return documents
//! (no IO, no HTTP, no storage).

pub mod party;

pub use party::{ContactInfo, Customer, PartyDetails, PartyKind, Supplier};
