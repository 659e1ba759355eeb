use std::{ops::Bound, sync::Arc};

use rust_decimal::Decimal;
use time::Date;

use crate::models::{write::CreateEntryCommand, Entry};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("entry not found: {0}")]
    EntryNotFound(u64),
    #[error("no active transaction")]
    NoActiveTransaction,
    #[error("book not found: {0}")]
    BookNotFound(String),
    #[error("book already exists: {0}")]
    BookAlreadyExists(String),
}

pub type TxId = u64;

/// Entries of one book read under a single consistent view, together with
/// the book's opening balance at the time of the read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSlice {
    pub opening_balance: Decimal,
    /// Ordered by `(date, sequence)`.
    pub entries: Vec<Entry>,
}

pub trait StorageBackend: Send + Sync {
    // Book management
    fn create_book(&self, book_id: &str) -> Result<(), StorageError>;
    fn list_books(&self) -> Vec<Arc<str>>;
    fn book_exists(&self, book_id: &str) -> bool;
    fn set_opening_balance(&self, book_id: &str, balance: Decimal) -> Result<(), StorageError>;

    // All entry operations scoped by book_id
    fn get_entry(&self, book_id: &str, sequence: u64) -> Result<Entry, StorageError>;
    fn append_entry(&self, book_id: &str, command: &CreateEntryCommand) -> Result<Entry, StorageError>;
    /// Replaces the entry in place; it keeps its sequence.
    fn replace_entry(&self, book_id: &str, sequence: u64, command: &CreateEntryCommand) -> Result<Entry, StorageError>;
    fn remove_entry(&self, book_id: &str, sequence: u64) -> Result<Entry, StorageError>;
    fn read_entries(&self, book_id: &str, from: Bound<Date>, to: Bound<Date>) -> Result<LedgerSlice, StorageError>;
    /// Opening balance plus every entry dated on or before `date`.
    fn get_balance(&self, book_id: &str, date: Date) -> Result<Decimal, StorageError>;

    /// Snapshots `book_id`; a rollback restores that book only.
    fn begin_transaction(&self, book_id: &str) -> Result<TxId, StorageError>;
    fn commit_transaction(&self, tx_id: TxId) -> Result<(), StorageError>;
    fn rollback_transaction(&self, tx_id: TxId) -> Result<(), StorageError>;
}
