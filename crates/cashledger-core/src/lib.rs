//! Core types and traits for cashledger storage backends.
//!
//! This crate provides the ledger domain model, the error taxonomy shared by
//! every layer, and the `StorageBackend` trait, enabling pluggable storage
//! implementations in separate crates.

pub mod error;
pub mod models;
pub mod storage;

// Re-export key types at crate root for convenience
pub use error::{ComputationError, ValidationError};
pub use models::{Entry, EntryType, JournalLine, Transaction};
pub use models::write::{CreateEntryCommand, JournalForm, RawAmount, RawEntry, RawJournalLine};
pub use models::read::{AnnotatedRow, BalanceTone, LedgerSnapshot, Rejection};
pub use storage::{LedgerSlice, StorageBackend, StorageError, TxId};
