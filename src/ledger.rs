use std::{ops::Bound, sync::Arc};

use rust_decimal::Decimal;
use time::Date;
use uuid::Uuid;

use cashledger_core::{
    ComputationError, CreateEntryCommand, Entry, JournalForm, RawEntry, RawJournalLine, Rejection, StorageBackend,
    StorageError, Transaction,
};

use crate::{
    accumulator::{self, Accumulation, FailurePolicy},
    error::LedgerError,
    filter::LedgerFilter,
    normalizer,
    projector::{self, PageRequest, PageView, PrintView},
};

/// One book of entries behind a storage backend. Every ledger-style screen
/// (cashbook, journal, print) reads its totals through here.
pub struct LedgerBook {
    storage: Arc<dyn StorageBackend>,
    book_id: Arc<str>,
    policy: FailurePolicy,
}

impl LedgerBook {
    /// Opens `book_id`, creating it on first use.
    pub fn new(storage: Arc<dyn StorageBackend>, book_id: &str, policy: FailurePolicy) -> Result<Self, LedgerError> {
        if !storage.book_exists(book_id) {
            storage.create_book(book_id)?;
        }
        Ok(Self {
            storage,
            book_id: Arc::from(book_id),
            policy,
        })
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn set_opening_balance(&self, balance: Decimal) -> Result<(), LedgerError> {
        let balance = normalizer::check_opening_balance(balance)?;
        self.storage.set_opening_balance(&self.book_id, balance)?;
        Ok(())
    }

    /// Validates and appends a single cashbook record.
    pub fn record(&self, raw: &RawEntry) -> Result<Entry, LedgerError> {
        let command = normalizer::normalize(raw)?;
        let entry = self.storage.append_entry(&self.book_id, &command)?;
        metrics::increment_counter!("cashledger_entries_recorded_total");
        tracing::debug!(book = %self.book_id, sequence = entry.sequence, trx_no = %entry.trx_no, "Entry recorded");
        Ok(entry)
    }

    /// Appends every valid record in one storage transaction. Under
    /// [`FailurePolicy::Abort`] a single bad record leaves the book untouched.
    pub fn record_batch(&self, raws: &[RawEntry]) -> Result<Vec<Rejection>, LedgerError> {
        let batch = normalizer::normalize_batch(raws, self.policy)?;
        let commands: Vec<CreateEntryCommand> = batch.commands.into_iter().map(|(_, c)| c).collect();
        let appended = self.append_all(&commands)?;
        tracing::info!(
            book = %self.book_id,
            recorded = appended.len(),
            rejected = batch.rejections.len(),
            "Cashbook batch recorded"
        );
        Ok(batch.rejections)
    }

    /// Posts the add-journal form as a DR/CR pair, generating a transaction
    /// id when the form has none.
    pub fn post_journal(&self, form: &JournalForm) -> Result<Transaction, LedgerError> {
        let mut form = form.clone();
        if form.transaction_id.as_deref().map_or(true, |id| id.trim().is_empty()) {
            form.transaction_id = Some(new_transaction_id());
        }
        let transaction = normalizer::journal_form(&form)?;
        self.append_all(&transaction.to_commands())?;
        tracing::debug!(book = %self.book_id, transaction_id = %transaction.transaction_id, "Journal posted");
        Ok(transaction)
    }

    pub fn post_journal_lines(&self, raws: &[RawJournalLine]) -> Result<Vec<Rejection>, LedgerError> {
        let journal = normalizer::normalize_journal(raws, self.policy)?;
        let commands: Vec<CreateEntryCommand> = journal.transactions.iter().flat_map(|t| t.to_commands()).collect();
        let appended = self.append_all(&commands)?;
        tracing::info!(
            book = %self.book_id,
            transactions = journal.transactions.len(),
            recorded = appended.len(),
            rejected = journal.rejections.len(),
            "Journal batch recorded"
        );
        Ok(journal.rejections)
    }

    /// Replaces a cashbook entry; it keeps its place in the ledger order.
    /// Journal lines only change through [`LedgerBook::edit_journal`].
    pub fn edit(&self, sequence: u64, raw: &RawEntry) -> Result<Entry, LedgerError> {
        let command = normalizer::normalize(raw)?;
        self.ensure_standalone(sequence)?;
        Ok(self.storage.replace_entry(&self.book_id, sequence, &command)?)
    }

    pub fn delete(&self, sequence: u64) -> Result<Entry, LedgerError> {
        self.ensure_standalone(sequence)?;
        Ok(self.storage.remove_entry(&self.book_id, sequence)?)
    }

    /// Rewrites every line of a posted journal transaction from `form`.
    /// Existing lines are replaced in sequence order, so the transaction
    /// keeps its place in the ledger.
    pub fn edit_journal(&self, transaction_id: &str, form: &JournalForm) -> Result<Transaction, LedgerError> {
        let mut form = form.clone();
        form.transaction_id = Some(transaction_id.to_string());
        let transaction = normalizer::journal_form(&form)?;

        let sequences = self.transaction_sequences(transaction_id)?;
        let commands = transaction.to_commands();
        self.in_transaction(|| {
            for (i, command) in commands.iter().enumerate() {
                match sequences.get(i) {
                    Some(&sequence) => self.storage.replace_entry(&self.book_id, sequence, command)?,
                    None => self.storage.append_entry(&self.book_id, command)?,
                };
            }
            for &sequence in sequences.iter().skip(commands.len()) {
                self.storage.remove_entry(&self.book_id, sequence)?;
            }
            Ok(())
        })?;

        tracing::debug!(book = %self.book_id, transaction_id, "Journal edited");
        Ok(transaction)
    }

    /// Removes every line of a journal transaction together.
    pub fn delete_transaction(&self, transaction_id: &str) -> Result<Vec<Entry>, LedgerError> {
        let sequences = self.transaction_sequences(transaction_id)?;
        let removed = self.in_transaction(|| {
            sequences
                .iter()
                .map(|&sequence| self.storage.remove_entry(&self.book_id, sequence))
                .collect::<Result<Vec<Entry>, StorageError>>()
        })?;

        tracing::debug!(book = %self.book_id, transaction_id, lines = removed.len(), "Journal deleted");
        Ok(removed)
    }

    /// Accumulates the entries visible through `filter`. With a lower date
    /// bound, matching entries before it roll into the opening balance.
    pub fn accumulate(&self, filter: &LedgerFilter) -> Result<Accumulation, LedgerError> {
        let slice = self.storage.read_entries(&self.book_id, Bound::Unbounded, filter.to)?;

        let mut opening_balance = slice.opening_balance;
        let mut visible = Vec::new();
        for entry in slice.entries {
            if !filter.matches_attributes(&entry) {
                continue;
            }
            if filter.precedes(entry.date) {
                opening_balance = opening_balance.checked_add(entry.net()).ok_or(ComputationError::BalanceOverflow {
                    date: entry.date,
                    sequence: entry.sequence,
                })?;
            } else if filter.matches(&entry) {
                visible.push(entry);
            }
        }

        Ok(accumulator::accumulate(opening_balance, &visible)?)
    }

    pub fn page(&self, filter: &LedgerFilter, request: &PageRequest) -> Result<PageView, LedgerError> {
        Ok(projector::project_page(&self.accumulate(filter)?, request))
    }

    pub fn print(&self, filter: &LedgerFilter) -> Result<PrintView, LedgerError> {
        Ok(projector::project_print(&self.accumulate(filter)?))
    }

    /// Closing balance of the whole book at the end of `date`.
    pub fn balance_as_of(&self, date: Date) -> Result<Decimal, LedgerError> {
        Ok(self.storage.get_balance(&self.book_id, date)?)
    }

    fn append_all(&self, commands: &[CreateEntryCommand]) -> Result<Vec<Entry>, LedgerError> {
        let appended = self.in_transaction(|| {
            commands
                .iter()
                .map(|command| self.storage.append_entry(&self.book_id, command))
                .collect::<Result<Vec<Entry>, StorageError>>()
        })?;
        metrics::counter!("cashledger_entries_recorded_total", appended.len() as u64);
        Ok(appended)
    }

    /// Runs `work` inside one storage transaction on this book, rolling back
    /// on the first storage error.
    fn in_transaction<T>(&self, work: impl FnOnce() -> Result<T, StorageError>) -> Result<T, LedgerError> {
        let tx_id = self.storage.begin_transaction(&self.book_id)?;
        match work() {
            Ok(value) => {
                self.storage.commit_transaction(tx_id)?;
                Ok(value)
            }
            Err(e) => {
                self.storage.rollback_transaction(tx_id)?;
                Err(e.into())
            }
        }
    }

    fn ensure_standalone(&self, sequence: u64) -> Result<(), LedgerError> {
        match self.storage.get_entry(&self.book_id, sequence)?.transaction_id {
            Some(transaction_id) => Err(LedgerError::JournalEntry {
                sequence,
                transaction_id: transaction_id.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Sequences of a transaction's lines, ascending.
    fn transaction_sequences(&self, transaction_id: &str) -> Result<Vec<u64>, LedgerError> {
        let slice = self.storage.read_entries(&self.book_id, Bound::Unbounded, Bound::Unbounded)?;
        let mut sequences: Vec<u64> = slice
            .entries
            .iter()
            .filter(|e| e.transaction_id.as_deref() == Some(transaction_id))
            .map(|e| e.sequence)
            .collect();
        if sequences.is_empty() {
            return Err(LedgerError::TransactionNotFound(transaction_id.to_string()));
        }
        sequences.sort_unstable();
        Ok(sequences)
    }
}

fn new_transaction_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}
