//! Persistent store of application records.
//!
//! The ledger owns every persisted [`ApplicationRecord`](lazyhire_core::ApplicationRecord).
//! Bulk inserts run inside a single SQLite transaction and are all-or-nothing;
//! the only rows a batch may leave out are duplicates of records a collector
//! already delivered (same title, company and source).

pub mod error;
pub mod store;

pub use error::LedgerError;
pub use store::{InsertOutcome, Ledger};
