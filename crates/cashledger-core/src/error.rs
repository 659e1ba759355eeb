use rust_decimal::Decimal;
use thiserror::Error;
use time::Date;

/// Why a raw record could not become a ledger entry.
///
/// These surface to whoever submitted the record (usually a form) so the
/// message names the broken rule rather than the internal field layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{field} is not a valid date: {value}")]
    InvalidDate { field: &'static str, value: String },
    #[error("{field} must be a non-negative amount with at most two decimals: {value}")]
    InvalidAmount { field: &'static str, value: String },
    #[error("{field} exceeds the largest supported amount: {value}")]
    AmountOutOfRange { field: &'static str, value: Decimal },
    #[error("entry type must be DR or CR: {0}")]
    InvalidEntryType(String),
    #[error("{}", unbalanced_entry_message(.debit, .credit))]
    UnbalancedEntry { debit: Decimal, credit: Decimal },
    #[error("transaction {transaction_id} is unbalanced: debits ({debits}) != credits ({credits})")]
    UnbalancedTransaction {
        transaction_id: String,
        debits: Decimal,
        credits: Decimal,
    },
}

fn unbalanced_entry_message(debit: &Decimal, credit: &Decimal) -> &'static str {
    if debit.is_zero() && credit.is_zero() {
        "enter either a debit or a credit amount"
    } else {
        "enter either a debit or a credit, not both"
    }
}

/// Internal consistency failures of the accumulator. Well-formed input never
/// produces one; seeing it means the caller handed over a broken sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputationError {
    #[error("ambiguous ordering: more than one entry dated {date} has sequence {sequence}")]
    NonDeterministicOrdering { date: Date, sequence: u64 },
    #[error("entry dated {date} with sequence {sequence} sorts before the checkpoint")]
    CheckpointRegression { date: Date, sequence: u64 },
    #[error("running balance overflowed at the entry dated {date} with sequence {sequence}")]
    BalanceOverflow { date: Date, sequence: u64 },
}
