use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use cashledger_core::{AnnotatedRow, ComputationError, Entry, LedgerSnapshot, RawEntry, RawJournalLine, Rejection};

use crate::{error::LedgerError, normalizer};

/// What a batch does with a record that fails validation. One policy per
/// book; cashbook and journal input follow the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Reject the whole batch.
    #[default]
    Abort,
    /// Leave the record out and report it.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accumulation {
    /// In ledger order.
    pub rows: Vec<AnnotatedRow>,
    pub snapshot: LedgerSnapshot,
}

impl Accumulation {
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            opening_balance: self.snapshot.opening_balance,
            balance: self.snapshot.closing_balance,
            total_debit: self.snapshot.total_debit,
            total_credit: self.snapshot.total_credit,
            last: self.rows.last().map(|r| r.entry.ordering_key()),
        }
    }
}

/// Confirmed running state after the last accumulated entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub opening_balance: Decimal,
    pub balance: Decimal,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub last: Option<(Date, u64)>,
}

impl Checkpoint {
    pub fn start(opening_balance: Decimal) -> Self {
        Self {
            opening_balance,
            balance: opening_balance,
            total_debit: Decimal::ZERO,
            total_credit: Decimal::ZERO,
            last: None,
        }
    }
}

/// Sorts by date, then by insertion sequence. Two entries with the same key
/// would make the running balance depend on input order, so that is an error.
pub fn order_entries(entries: &[Entry]) -> Result<Vec<&Entry>, ComputationError> {
    let mut ordered: Vec<&Entry> = entries.iter().collect();
    ordered.sort_by_key(|e| e.ordering_key());

    if let Some(pair) = ordered.windows(2).find(|p| p[0].ordering_key() == p[1].ordering_key()) {
        return Err(ComputationError::NonDeterministicOrdering {
            date: pair[1].date,
            sequence: pair[1].sequence,
        });
    }
    Ok(ordered)
}

pub fn accumulate(opening_balance: Decimal, entries: &[Entry]) -> Result<Accumulation, ComputationError> {
    resume(&Checkpoint::start(opening_balance), entries)
}

/// Continues from `checkpoint`. The returned rows hold only `entries`; the
/// snapshot covers everything since the checkpoint's opening balance.
pub fn resume(checkpoint: &Checkpoint, entries: &[Entry]) -> Result<Accumulation, ComputationError> {
    let ordered = order_entries(entries)?;

    if let (Some(last), Some(first)) = (checkpoint.last, ordered.first()) {
        if first.ordering_key() <= last {
            return Err(ComputationError::CheckpointRegression {
                date: first.date,
                sequence: first.sequence,
            });
        }
    }

    let mut balance = checkpoint.balance;
    let mut total_debit = checkpoint.total_debit;
    let mut total_credit = checkpoint.total_credit;
    let mut rows = Vec::with_capacity(ordered.len());

    for entry in ordered {
        let overflow = || ComputationError::BalanceOverflow {
            date: entry.date,
            sequence: entry.sequence,
        };
        total_debit = total_debit.checked_add(entry.debit).ok_or_else(overflow)?;
        total_credit = total_credit.checked_add(entry.credit).ok_or_else(overflow)?;
        balance = balance.checked_add(entry.net()).ok_or_else(overflow)?;
        rows.push(AnnotatedRow {
            entry: entry.clone(),
            running_balance: balance,
        });
    }

    let snapshot = LedgerSnapshot::new(checkpoint.opening_balance, total_debit, total_credit);
    debug_assert_eq!(snapshot.closing_balance, balance);

    Ok(Accumulation { rows, snapshot })
}

/// Normalizes and accumulates cashbook records in one pass. Sequences are the
/// 1-based record positions, so rejected records leave gaps rather than
/// renumbering the rest.
pub fn accumulate_raw(
    opening_balance: Decimal,
    raws: &[RawEntry],
    policy: FailurePolicy,
) -> Result<(Accumulation, Vec<Rejection>), LedgerError> {
    let batch = normalizer::normalize_batch(raws, policy)?;
    let entries: Vec<Entry> = batch
        .commands
        .into_iter()
        .map(|(position, command)| command.into_entry(position as u64 + 1))
        .collect();

    Ok((accumulate(opening_balance, &entries)?, batch.rejections))
}

/// Same as [`accumulate_raw`] for journal rows: each balanced transaction
/// contributes its DR and CR lines as entries.
pub fn accumulate_journal(
    opening_balance: Decimal,
    raws: &[RawJournalLine],
    policy: FailurePolicy,
) -> Result<(Accumulation, Vec<Rejection>), LedgerError> {
    let journal = normalizer::normalize_journal(raws, policy)?;
    let entries: Vec<Entry> = journal
        .transactions
        .iter()
        .flat_map(|t| t.to_commands())
        .zip(1u64..)
        .map(|(command, sequence)| command.into_entry(sequence))
        .collect();

    Ok((accumulate(opening_balance, &entries)?, journal.rejections))
}
