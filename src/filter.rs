use std::{ops::{Bound, RangeBounds}, sync::Arc};

use time::Date;

use cashledger_core::Entry;

/// The predicate a table and its print statement are both computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerFilter {
    pub from: Bound<Date>,
    pub to: Bound<Date>,
    pub account: Option<Arc<str>>,
    pub town: Option<Arc<str>>,
    pub search: Option<String>,
}

impl Default for LedgerFilter {
    fn default() -> Self {
        Self {
            from: Bound::Unbounded,
            to: Bound::Unbounded,
            account: None,
            town: None,
            search: None,
        }
    }
}

impl LedgerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn between(mut self, from: Bound<Date>, to: Bound<Date>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn account(mut self, account: &str) -> Self {
        self.account = Some(Arc::from(account));
        self
    }

    pub fn town(mut self, town: &str) -> Self {
        self.town = Some(Arc::from(town));
        self
    }

    pub fn search(mut self, text: &str) -> Self {
        self.search = Some(text.to_string());
        self
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        (self.from, self.to).contains(&entry.date) && self.matches_attributes(entry)
    }

    /// Every predicate except the date range. All text comparisons fold
    /// case the same way.
    pub fn matches_attributes(&self, entry: &Entry) -> bool {
        if let Some(account) = &self.account {
            if fold(account) != fold(&entry.account) {
                return false;
            }
        }

        if let Some(town) = &self.town {
            match &entry.town {
                Some(t) if fold(t) == fold(town) => {}
                _ => return false,
            }
        }

        match self.search.as_deref().map(fold) {
            Some(needle) if !needle.is_empty() => [&entry.trx_no, &entry.account, &entry.particular]
                .iter()
                .any(|field| fold(field).contains(needle.as_str())),
            _ => true,
        }
    }

    /// True when `date` falls before the lower date bound, i.e. the entry
    /// belongs to the carried-forward opening balance.
    pub fn precedes(&self, date: Date) -> bool {
        match self.from {
            Bound::Included(from) => date < from,
            Bound::Excluded(from) => date <= from,
            Bound::Unbounded => false,
        }
    }
}

fn fold(text: &str) -> String {
    text.to_lowercase()
}
