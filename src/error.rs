use cashledger_core::{ComputationError, StorageError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("record {position} rejected: {error}")]
    Rejected { position: usize, error: ValidationError },
    #[error("entry {sequence} is one side of journal transaction {transaction_id}; change the whole transaction instead")]
    JournalEntry { sequence: u64, transaction_id: String },
    #[error("journal transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("computation error: {0}")]
    Computation(#[from] ComputationError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid input file: {0}")]
    Json(#[from] serde_json::Error),
}
