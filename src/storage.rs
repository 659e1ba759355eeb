// Re-export storage types so callers only need this crate
pub use cashledger_core::storage::{LedgerSlice, StorageBackend, StorageError, TxId};
pub use cashledger_memory::{InMemoryStorage, DEFAULT_BOOK};
