//! `depot-audit`: append-only record of user actions.
//!
//! Entries are facts: they are written once as a side effect of a business
//! operation and never updated or deleted by normal operation.

pub mod action;
pub mod entry;
pub mod query;

pub use action::{ActionKind, UnknownActionKind};
pub use entry::{Actor, LogEntry};
pub use query::{LogFilter, LogPage, Pagination};
