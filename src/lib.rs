//! Cashbook and journal balance engine.
//!
//! Raw records are normalized into entries, written to a [`storage::StorageBackend`]
//! book, and read back as running balances through [`ledger::LedgerBook`].

pub mod accumulator;
pub mod config;
pub mod error;
pub mod filter;
pub mod ledger;
pub mod normalizer;
pub mod projector;
pub mod report;
pub mod storage;

pub use accumulator::{Accumulation, Checkpoint, FailurePolicy};
pub use error::LedgerError;
pub use filter::LedgerFilter;
pub use ledger::LedgerBook;
pub use projector::{PageRequest, PageView, PrintView, SortDirection, SortKey};
