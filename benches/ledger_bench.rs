use std::{ops::Bound, sync::Arc};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cashledger::accumulator::FailurePolicy;
use cashledger::filter::LedgerFilter;
use cashledger::ledger::LedgerBook;
use cashledger::normalizer;
use cashledger::projector::{PageRequest, SortDirection, SortKey};
use cashledger::storage::{InMemoryStorage, StorageBackend};
use cashledger_core::RawEntry;
use rust_decimal::Decimal;

const TOWNS: [&str; 3] = ["Sukkur", "Karachi", "Hyderabad"];

fn raw_entries(count: usize) -> Vec<RawEntry> {
    (0..count)
        .map(|i| {
            let date = format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1);
            let raw = RawEntry::new(&date, "Cash in Hand", &format!("Entry {}", i)).with_town(TOWNS[i % TOWNS.len()]);
            if i % 3 == 0 {
                raw.with_credit(format!("{}.50", i * 7).as_str())
            } else {
                raw.with_debit(format!("{}", i * 11 + 1).as_str())
            }
        })
        .collect()
}

fn setup() -> LedgerBook {
    let storage: Arc<dyn StorageBackend> = Arc::new(InMemoryStorage::new());
    let book = LedgerBook::new(storage, "bench", FailurePolicy::Abort).unwrap();
    book.set_opening_balance(Decimal::from(125_000)).unwrap();
    book.record_batch(&raw_entries(500)).unwrap();
    book
}

fn bench_normalize(c: &mut Criterion) {
    let raws = raw_entries(500);
    c.bench_function("normalize_batch_500", |b| {
        b.iter(|| normalizer::normalize_batch(black_box(&raws), FailurePolicy::Abort).unwrap())
    });
}

fn bench_accumulate(c: &mut Criterion) {
    let book = setup();
    let all = LedgerFilter::new();
    let ranged = LedgerFilter::new()
        .between(
            Bound::Included(time::Date::from_calendar_date(2024, time::Month::June, 1).unwrap()),
            Bound::Unbounded,
        )
        .town("Sukkur");

    c.bench_function("accumulate_all", |b| b.iter(|| book.accumulate(black_box(&all)).unwrap()));
    c.bench_function("accumulate_carry_forward", |b| b.iter(|| book.accumulate(black_box(&ranged)).unwrap()));
}

fn bench_views(c: &mut Criterion) {
    let book = setup();
    let filter = LedgerFilter::new().search("entry 1");
    let request = PageRequest::new(3, 10).sorted(SortKey::Balance, SortDirection::Descending);

    c.bench_function("page_sorted", |b| b.iter(|| book.page(black_box(&filter), &request).unwrap()));
    c.bench_function("print", |b| b.iter(|| book.print(black_box(&filter)).unwrap()));
}

criterion_group!(benches, bench_normalize, bench_accumulate, bench_views);
criterion_main!(benches);
