use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use time::{macros::date, Duration};

use cashledger::{
    accumulator::{accumulate, order_entries, resume, FailurePolicy},
    filter::LedgerFilter,
    ledger::LedgerBook,
    projector::PageRequest,
    storage::{InMemoryStorage, StorageBackend},
};
use cashledger_core::{Entry, RawEntry};

const ACCOUNTS: [&str; 5] = ["Cash in Hand", "Bank - HBL", "Rent Expense", "Sales Revenue", "Customer - Ali Traders"];
const TOWNS: [&str; 4] = ["Sukkur", "Karachi", "Hyderabad", "Larkana"];

#[derive(Debug, Clone)]
struct EntrySeed {
    day: i64,
    account: usize,
    town: usize,
    debit_side: bool,
    cents: i64,
}

fn seed_strategy() -> impl Strategy<Value = EntrySeed> {
    (0i64..60, 0..ACCOUNTS.len(), 0..TOWNS.len(), any::<bool>(), 1i64..10_000_000).prop_map(
        |(day, account, town, debit_side, cents)| EntrySeed { day, account, town, debit_side, cents },
    )
}

fn entries_strategy() -> impl Strategy<Value = Vec<Entry>> {
    proptest::collection::vec(seed_strategy(), 0..40).prop_map(|seeds| {
        seeds.into_iter().zip(1u64..).map(|(seed, sequence)| to_entry(&seed, sequence)).collect()
    })
}

fn to_entry(seed: &EntrySeed, sequence: u64) -> Entry {
    let amount = Decimal::new(seed.cents, 2);
    Entry {
        sequence,
        trx_no: format!("TRX-{:06}-24", sequence).into(),
        date: date!(2024 - 01 - 01) + Duration::days(seed.day),
        account: ACCOUNTS[seed.account].into(),
        town: Some(Arc::from(TOWNS[seed.town])),
        particular: "Generated".into(),
        debit: if seed.debit_side { amount } else { Decimal::ZERO },
        credit: if seed.debit_side { Decimal::ZERO } else { amount },
        transaction_id: None,
    }
}

fn to_raw(entry: &Entry) -> RawEntry {
    let raw = RawEntry::new(&entry.date.to_string(), &entry.account, &entry.particular)
        .with_town(entry.town.as_deref().unwrap_or_default());
    if entry.debit > Decimal::ZERO {
        raw.with_debit(entry.debit.to_string().as_str())
    } else {
        raw.with_credit(entry.credit.to_string().as_str())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_input_order_does_not_change_balances(
        (entries, shuffled) in entries_strategy().prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
        opening in -1_000_000i64..1_000_000,
    ) {
        let opening = Decimal::new(opening, 2);
        prop_assert_eq!(accumulate(opening, &entries).unwrap(), accumulate(opening, &shuffled).unwrap());
    }

    #[test]
    fn prop_closing_balance_identity(entries in entries_strategy(), opening in -1_000_000i64..1_000_000) {
        let opening = Decimal::new(opening, 2);
        let acc = accumulate(opening, &entries).unwrap();
        let snapshot = acc.snapshot;

        prop_assert_eq!(snapshot.closing_balance, snapshot.opening_balance + snapshot.total_debit - snapshot.total_credit);
        match acc.rows.last() {
            Some(last) => prop_assert_eq!(last.running_balance, snapshot.closing_balance),
            None => prop_assert_eq!(snapshot.closing_balance, opening),
        }
        prop_assert_eq!(acc.clone(), accumulate(opening, &entries).unwrap());
    }

    #[test]
    fn prop_resume_equals_full_run(entries in entries_strategy(), split in 0usize..40) {
        let ordered: Vec<Entry> = order_entries(&entries).unwrap().into_iter().cloned().collect();
        let split = split.min(ordered.len());
        let full = accumulate(Decimal::ZERO, &ordered).unwrap();

        let head = accumulate(Decimal::ZERO, &ordered[..split]).unwrap();
        let tail = resume(&head.checkpoint(), &ordered[split..]).unwrap();

        prop_assert_eq!(tail.snapshot, full.snapshot);
        prop_assert_eq!(&tail.rows[..], &full.rows[split..]);
    }

    #[test]
    fn prop_every_page_reports_print_totals(
        entries in entries_strategy(),
        town in proptest::option::of(0..TOWNS.len()),
        page in 1usize..6,
        page_size in 1usize..12,
    ) {
        let storage: Arc<dyn StorageBackend> = Arc::new(InMemoryStorage::new());
        let book = LedgerBook::new(storage, "generated", FailurePolicy::Abort).unwrap();
        let raws: Vec<RawEntry> = entries.iter().map(to_raw).collect();
        prop_assert!(book.record_batch(&raws).unwrap().is_empty());

        let mut filter = LedgerFilter::new();
        if let Some(town) = town {
            filter = filter.town(TOWNS[town]);
        }

        let print = book.print(&filter).unwrap();
        let view = book.page(&filter, &PageRequest::new(page, page_size)).unwrap();
        prop_assert_eq!(view.snapshot, print.snapshot);
        prop_assert!(view.rows.len() <= page_size);
        prop_assert!(view.page >= 1 && view.page <= view.page_count);
    }
}
