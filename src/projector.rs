use std::cmp::Ordering;

use clap::ValueEnum;
use serde::Deserialize;

use cashledger_core::{AnnotatedRow, LedgerSnapshot};

use crate::accumulator::Accumulation;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Date, then insertion order.
    #[default]
    Ledger,
    Date,
    TrxNo,
    Account,
    Debit,
    Credit,
    Balance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sort {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// A 1-based page of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
    pub sort: Sort,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: Sort::default(),
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page,
            page_size,
            sort: Sort::default(),
        }
    }

    pub fn sorted(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort = Sort { key, direction };
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub rows: Vec<AnnotatedRow>,
    /// The page actually served, after clamping.
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total_rows: usize,
    /// Totals over the whole filtered set, not just this page.
    pub snapshot: LedgerSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintView {
    pub rows: Vec<AnnotatedRow>,
    pub snapshot: LedgerSnapshot,
}

pub fn project_page(accumulation: &Accumulation, request: &PageRequest) -> PageView {
    let page_size = request.page_size.max(1);
    let total_rows = accumulation.rows.len();
    let page_count = total_rows.div_ceil(page_size).max(1);
    let page = request.page.clamp(1, page_count);

    let mut ordered: Vec<&AnnotatedRow> = accumulation.rows.iter().collect();
    sort_rows(&mut ordered, request.sort);

    let rows = ordered
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .cloned()
        .collect();

    PageView {
        rows,
        page,
        page_size,
        page_count,
        total_rows,
        snapshot: accumulation.snapshot,
    }
}

pub fn project_print(accumulation: &Accumulation) -> PrintView {
    PrintView {
        rows: accumulation.rows.clone(),
        snapshot: accumulation.snapshot,
    }
}

fn sort_rows(rows: &mut [&AnnotatedRow], sort: Sort) {
    if sort == Sort::default() {
        return;
    }

    rows.sort_by(|a, b| {
        let ordering = compare(sort.key, a, b);
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

fn compare(key: SortKey, a: &AnnotatedRow, b: &AnnotatedRow) -> Ordering {
    match key {
        SortKey::Ledger => a.entry.ordering_key().cmp(&b.entry.ordering_key()),
        SortKey::Date => a.entry.date.cmp(&b.entry.date),
        SortKey::TrxNo => a.entry.trx_no.cmp(&b.entry.trx_no),
        SortKey::Account => a.entry.account.to_lowercase().cmp(&b.entry.account.to_lowercase()),
        SortKey::Debit => a.entry.debit.cmp(&b.entry.debit),
        SortKey::Credit => a.entry.credit.cmp(&b.entry.credit),
        SortKey::Balance => a.running_balance.cmp(&b.running_balance),
    }
}
