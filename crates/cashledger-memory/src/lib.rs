//! In-memory storage backend for cashledger.

use std::{collections::{BTreeMap, HashMap}, ops::Bound, sync::{Arc, PoisonError, RwLock, atomic::{AtomicU64, Ordering}}};

use rust_decimal::Decimal;
use time::Date;

use cashledger_core::{CreateEntryCommand, Entry, LedgerSlice, StorageBackend, StorageError, TxId};

/// Book used when no book is specified
pub const DEFAULT_BOOK: &str = "default";

#[derive(Clone)]
struct BookData {
    opening_balance: Decimal,
    days: BTreeMap<Date, LedgerDay>,
    dates: HashMap<u64, Date>,
    next_sequence: u64,
}

impl BookData {
    fn new() -> Self {
        Self {
            opening_balance: Decimal::ZERO,
            days: BTreeMap::new(),
            dates: HashMap::new(),
            next_sequence: 1,
        }
    }

    fn insert(&mut self, entry: Entry) {
        self.dates.insert(entry.sequence, entry.date);
        self.days.entry(entry.date).or_insert_with(LedgerDay::new).add_entry(entry);
    }

    fn take(&mut self, sequence: u64) -> Option<Entry> {
        let date = self.dates.remove(&sequence)?;
        let day = self.days.get_mut(&date)?;
        let entry = day.remove_entry(sequence);
        if day.entries.is_empty() {
            self.days.remove(&date);
        }
        entry
    }
}

struct Snapshot {
    book_id: Arc<str>,
    book: BookData,
}

pub struct InMemoryStorage {
    books: RwLock<BTreeMap<Arc<str>, BookData>>,
    tx_counter: AtomicU64,
    snapshots: RwLock<HashMap<TxId, Snapshot>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        let mut books = BTreeMap::new();
        books.insert(Arc::from(DEFAULT_BOOK), BookData::new());
        Self {
            books: RwLock::new(books),
            tx_counter: AtomicU64::new(1),
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    fn with_book<T>(&self, book_id: &str, f: impl FnOnce(&BookData) -> Result<T, StorageError>) -> Result<T, StorageError> {
        let books = self.books.read().unwrap_or_else(PoisonError::into_inner);
        let book = books.get(book_id)
            .ok_or_else(|| StorageError::BookNotFound(book_id.to_string()))?;
        f(book)
    }

    fn with_book_mut<T>(&self, book_id: &str, f: impl FnOnce(&mut BookData) -> Result<T, StorageError>) -> Result<T, StorageError> {
        let mut books = self.books.write().unwrap_or_else(PoisonError::into_inner);
        let book = books.get_mut(book_id)
            .ok_or_else(|| StorageError::BookNotFound(book_id.to_string()))?;
        f(book)
    }
}

impl StorageBackend for InMemoryStorage {
    fn create_book(&self, book_id: &str) -> Result<(), StorageError> {
        let mut books = self.books.write().unwrap_or_else(PoisonError::into_inner);
        let key: Arc<str> = Arc::from(book_id);
        if books.contains_key(&key) {
            return Err(StorageError::BookAlreadyExists(book_id.to_string()));
        }
        books.insert(key, BookData::new());
        Ok(())
    }

    fn list_books(&self) -> Vec<Arc<str>> {
        self.books.read().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect()
    }

    fn book_exists(&self, book_id: &str) -> bool {
        self.books.read().unwrap_or_else(PoisonError::into_inner).contains_key(book_id)
    }

    fn set_opening_balance(&self, book_id: &str, balance: Decimal) -> Result<(), StorageError> {
        self.with_book_mut(book_id, |book| {
            book.opening_balance = balance;
            Ok(())
        })
    }

    fn get_entry(&self, book_id: &str, sequence: u64) -> Result<Entry, StorageError> {
        self.with_book(book_id, |book| {
            book.dates
                .get(&sequence)
                .and_then(|date| book.days.get(date))
                .and_then(|day| day.entries.get(&sequence))
                .cloned()
                .ok_or(StorageError::EntryNotFound(sequence))
        })
    }

    fn append_entry(&self, book_id: &str, command: &CreateEntryCommand) -> Result<Entry, StorageError> {
        self.with_book_mut(book_id, |book| {
            let sequence = book.next_sequence;
            book.next_sequence += 1;
            let entry = command.clone().into_entry(sequence);
            book.insert(entry.clone());
            Ok(entry)
        })
    }

    fn replace_entry(&self, book_id: &str, sequence: u64, command: &CreateEntryCommand) -> Result<Entry, StorageError> {
        self.with_book_mut(book_id, |book| {
            let previous = book.take(sequence)
                .ok_or(StorageError::EntryNotFound(sequence))?;
            let mut command = command.clone();
            if command.trx_no.is_none() {
                command.trx_no = Some(previous.trx_no);
            }
            let entry = command.into_entry(sequence);
            book.insert(entry.clone());
            Ok(entry)
        })
    }

    fn remove_entry(&self, book_id: &str, sequence: u64) -> Result<Entry, StorageError> {
        self.with_book_mut(book_id, |book| {
            book.take(sequence).ok_or(StorageError::EntryNotFound(sequence))
        })
    }

    fn read_entries(&self, book_id: &str, from: Bound<Date>, to: Bound<Date>) -> Result<LedgerSlice, StorageError> {
        self.with_book(book_id, |book| {
            let mut entries = Vec::new();
            if !range_is_empty(from, to) {
                for (_, day) in book.days.range((from, to)) {
                    entries.extend(day.entries.values().cloned());
                }
            }
            Ok(LedgerSlice {
                opening_balance: book.opening_balance,
                entries,
            })
        })
    }

    fn get_balance(&self, book_id: &str, date: Date) -> Result<Decimal, StorageError> {
        self.with_book(book_id, |book| {
            let mut balance = book.opening_balance;
            for (_, day) in book.days.range((Bound::Unbounded, Bound::Included(date))) {
                balance += day.total_debit - day.total_credit;
            }
            Ok(balance)
        })
    }

    fn begin_transaction(&self, book_id: &str) -> Result<TxId, StorageError> {
        let book = self.with_book(book_id, |book| Ok(book.clone()))?;
        let tx_id = self.tx_counter.fetch_add(1, Ordering::SeqCst);
        let snapshot = Snapshot {
            book_id: Arc::from(book_id),
            book,
        };
        self.snapshots.write().unwrap_or_else(PoisonError::into_inner).insert(tx_id, snapshot);
        tracing::debug!(tx_id, book = book_id, "Transaction started");
        Ok(tx_id)
    }

    fn commit_transaction(&self, tx_id: TxId) -> Result<(), StorageError> {
        self.snapshots.write().unwrap_or_else(PoisonError::into_inner).remove(&tx_id)
            .ok_or(StorageError::NoActiveTransaction)?;
        tracing::debug!(tx_id, "Transaction committed");
        Ok(())
    }

    fn rollback_transaction(&self, tx_id: TxId) -> Result<(), StorageError> {
        let snapshot = self.snapshots.write().unwrap_or_else(PoisonError::into_inner).remove(&tx_id)
            .ok_or(StorageError::NoActiveTransaction)?;
        tracing::debug!(tx_id, book = %snapshot.book_id, "Transaction rolled back");
        self.books.write().unwrap_or_else(PoisonError::into_inner).insert(snapshot.book_id, snapshot.book);
        Ok(())
    }
}

// BTreeMap::range panics on inverted bounds
fn range_is_empty(from: Bound<Date>, to: Bound<Date>) -> bool {
    match (from, to) {
        (Bound::Included(a), Bound::Included(b)) => a > b,
        (Bound::Included(a), Bound::Excluded(b))
        | (Bound::Excluded(a), Bound::Included(b))
        | (Bound::Excluded(a), Bound::Excluded(b)) => a >= b,
        _ => false,
    }
}

#[derive(Debug, Clone)]
struct LedgerDay {
    entries: BTreeMap<u64, Entry>,
    total_debit: Decimal,
    total_credit: Decimal,
}

impl LedgerDay {
    fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            total_debit: Decimal::ZERO,
            total_credit: Decimal::ZERO,
        }
    }

    fn add_entry(&mut self, entry: Entry) {
        self.total_debit += entry.debit;
        self.total_credit += entry.credit;
        self.entries.insert(entry.sequence, entry);
    }

    fn remove_entry(&mut self, sequence: u64) -> Option<Entry> {
        let entry = self.entries.remove(&sequence)?;
        self.total_debit -= entry.debit;
        self.total_credit -= entry.credit;
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use super::*;

    fn command(date: Date, debit: Decimal, credit: Decimal) -> CreateEntryCommand {
        CreateEntryCommand {
            trx_no: None,
            date,
            account: "Cash in Hand".into(),
            town: None,
            particular: "Cash sales".into(),
            debit,
            credit,
            transaction_id: None,
        }
    }

    #[test]
    fn test_sequences_follow_insertion_order() {
        let storage = InMemoryStorage::new();
        let a = storage.append_entry(DEFAULT_BOOK, &command(date!(2024 - 02 - 01), dec!(10), dec!(0))).unwrap();
        let b = storage.append_entry(DEFAULT_BOOK, &command(date!(2024 - 01 - 01), dec!(0), dec!(4))).unwrap();
        assert_eq!((a.sequence, b.sequence), (1, 2));
        assert_eq!(&*b.trx_no, "TRX-000002-24");

        let slice = storage.read_entries(DEFAULT_BOOK, Bound::Unbounded, Bound::Unbounded).unwrap();
        let order: Vec<u64> = slice.entries.iter().map(|e| e.sequence).collect();
        assert_eq!(order, vec![2, 1]);
    }

    #[test]
    fn test_removed_sequence_is_not_reused() {
        let storage = InMemoryStorage::new();
        let day = date!(2024 - 01 - 05);
        storage.append_entry(DEFAULT_BOOK, &command(day, dec!(10), dec!(0))).unwrap();
        let second = storage.append_entry(DEFAULT_BOOK, &command(day, dec!(20), dec!(0))).unwrap();
        storage.remove_entry(DEFAULT_BOOK, second.sequence).unwrap();

        let third = storage.append_entry(DEFAULT_BOOK, &command(day, dec!(30), dec!(0))).unwrap();
        assert_eq!(third.sequence, 3);
        assert!(matches!(storage.remove_entry(DEFAULT_BOOK, 2), Err(StorageError::EntryNotFound(2))));
    }

    #[test]
    fn test_replace_keeps_sequence_and_trx_no() {
        let storage = InMemoryStorage::new();
        let original = storage.append_entry(DEFAULT_BOOK, &command(date!(2024 - 01 - 05), dec!(10), dec!(0))).unwrap();
        let replaced = storage
            .replace_entry(DEFAULT_BOOK, original.sequence, &command(date!(2024 - 03 - 09), dec!(0), dec!(75)))
            .unwrap();

        assert_eq!(replaced.sequence, original.sequence);
        assert_eq!(replaced.trx_no, original.trx_no);
        assert_eq!(storage.get_balance(DEFAULT_BOOK, date!(2024 - 02 - 01)).unwrap(), dec!(0));
        assert_eq!(storage.get_balance(DEFAULT_BOOK, date!(2024 - 03 - 09)).unwrap(), dec!(-75));
    }

    #[test]
    fn test_read_entries_bounds() {
        let storage = InMemoryStorage::new();
        storage.set_opening_balance(DEFAULT_BOOK, dec!(1000)).unwrap();
        for (d, amount) in [(date!(2024 - 01 - 01), dec!(1)), (date!(2024 - 01 - 02), dec!(2)), (date!(2024 - 01 - 03), dec!(4))] {
            storage.append_entry(DEFAULT_BOOK, &command(d, amount, dec!(0))).unwrap();
        }

        let slice = storage
            .read_entries(DEFAULT_BOOK, Bound::Excluded(date!(2024 - 01 - 01)), Bound::Included(date!(2024 - 01 - 03)))
            .unwrap();
        assert_eq!(slice.opening_balance, dec!(1000));
        assert_eq!(slice.entries.len(), 2);

        let inverted = storage
            .read_entries(DEFAULT_BOOK, Bound::Included(date!(2024 - 01 - 03)), Bound::Excluded(date!(2024 - 01 - 01)))
            .unwrap();
        assert!(inverted.entries.is_empty());

        assert_eq!(storage.get_balance(DEFAULT_BOOK, date!(2024 - 01 - 02)).unwrap(), dec!(1003));
    }

    #[test]
    fn test_rollback_restores_entries_and_sequence() {
        let storage = InMemoryStorage::new();
        let day = date!(2024 - 04 - 01);
        storage.append_entry(DEFAULT_BOOK, &command(day, dec!(10), dec!(0))).unwrap();

        let tx = storage.begin_transaction(DEFAULT_BOOK).unwrap();
        storage.append_entry(DEFAULT_BOOK, &command(day, dec!(99), dec!(0))).unwrap();
        storage.rollback_transaction(tx).unwrap();

        assert_eq!(storage.get_balance(DEFAULT_BOOK, day).unwrap(), dec!(10));
        assert_eq!(storage.get_entry(DEFAULT_BOOK, 1).unwrap().debit, dec!(10));
        assert!(matches!(storage.get_entry(DEFAULT_BOOK, 2), Err(StorageError::EntryNotFound(2))));
        let next = storage.append_entry(DEFAULT_BOOK, &command(day, dec!(1), dec!(0))).unwrap();
        assert_eq!(next.sequence, 2);
        assert!(matches!(storage.commit_transaction(tx), Err(StorageError::NoActiveTransaction)));
    }

    #[test]
    fn test_books_are_isolated() {
        let storage = InMemoryStorage::new();
        storage.create_book("journal").unwrap();
        assert!(matches!(storage.create_book("journal"), Err(StorageError::BookAlreadyExists(_))));

        storage.append_entry("journal", &command(date!(2024 - 01 - 01), dec!(5), dec!(0))).unwrap();
        assert_eq!(storage.get_balance(DEFAULT_BOOK, date!(2024 - 12 - 31)).unwrap(), dec!(0));
        assert_eq!(storage.list_books().len(), 2);
        assert!(!storage.book_exists("cheques"));
        assert!(matches!(
            storage.read_entries("cheques", Bound::Unbounded, Bound::Unbounded),
            Err(StorageError::BookNotFound(_))
        ));
    }

    #[test]
    fn test_rollback_leaves_other_books_alone() {
        let storage = InMemoryStorage::new();
        storage.create_book("journal").unwrap();
        let day = date!(2024 - 04 - 01);

        let tx = storage.begin_transaction(DEFAULT_BOOK).unwrap();
        storage.append_entry(DEFAULT_BOOK, &command(day, dec!(99), dec!(0))).unwrap();
        storage.append_entry("journal", &command(day, dec!(7), dec!(0))).unwrap();
        storage.rollback_transaction(tx).unwrap();

        assert_eq!(storage.get_balance(DEFAULT_BOOK, day).unwrap(), dec!(0));
        assert_eq!(storage.get_balance("journal", day).unwrap(), dec!(7));
        assert!(matches!(storage.begin_transaction("cheques"), Err(StorageError::BookNotFound(_))));
    }
}
