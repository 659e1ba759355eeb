use std::{fmt::Display, sync::Arc};

use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use super::Entry;

/// An amount as it arrives from a form field or a fixture file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        RawAmount::Text(value.to_string())
    }
}

impl From<i64> for RawAmount {
    fn from(value: i64) -> Self {
        RawAmount::Int(value)
    }
}

impl From<i32> for RawAmount {
    fn from(value: i32) -> Self {
        RawAmount::Int(value.into())
    }
}

impl Display for RawAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawAmount::Int(i) => write!(f, "{}", i),
            RawAmount::Float(x) => write!(f, "{}", x),
            RawAmount::Text(s) => f.write_str(s),
        }
    }
}

/// A cashbook record before validation. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    pub trx_no: Option<String>,
    pub date: Option<String>,
    pub account: Option<String>,
    pub town: Option<String>,
    pub particular: Option<String>,
    pub debit: Option<RawAmount>,
    pub credit: Option<RawAmount>,
}

impl RawEntry {
    pub fn new(date: &str, account: &str, particular: &str) -> Self {
        Self {
            date: Some(date.to_string()),
            account: Some(account.to_string()),
            particular: Some(particular.to_string()),
            ..Default::default()
        }
    }

    pub fn with_debit(mut self, amount: impl Into<RawAmount>) -> Self {
        self.debit = Some(amount.into());
        self
    }

    pub fn with_credit(mut self, amount: impl Into<RawAmount>) -> Self {
        self.credit = Some(amount.into());
        self
    }

    pub fn with_town(mut self, town: &str) -> Self {
        self.town = Some(town.to_string());
        self
    }

    pub fn with_trx_no(mut self, trx_no: &str) -> Self {
        self.trx_no = Some(trx_no.to_string());
        self
    }
}

/// One DR or CR row of a journal export before validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawJournalLine {
    pub id: Option<u64>,
    #[serde(alias = "transactionId")]
    pub transaction_id: Option<String>,
    #[serde(alias = "created_at", alias = "createdAt")]
    pub date: Option<String>,
    #[serde(alias = "account_id", alias = "accountId")]
    pub account: Option<String>,
    #[serde(alias = "entryType")]
    pub entry_type: Option<String>,
    pub value: Option<RawAmount>,
    pub description: Option<String>,
    pub town: Option<String>,
}

/// The add-journal form: one amount moved from a credit account to a debit
/// account.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalForm {
    pub transaction_id: Option<String>,
    pub date: Option<String>,
    pub debit_account: Option<String>,
    pub credit_account: Option<String>,
    pub amount: Option<RawAmount>,
    pub description: Option<String>,
    pub town: Option<String>,
}

/// A validated entry waiting for its insertion sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEntryCommand {
    pub trx_no: Option<Arc<str>>,
    pub date: Date,
    pub account: Arc<str>,
    pub town: Option<Arc<str>>,
    pub particular: Arc<str>,
    pub debit: Decimal,
    pub credit: Decimal,
    /// Set on lines posted from a journal transaction.
    pub transaction_id: Option<Arc<str>>,
}

impl CreateEntryCommand {
    pub fn into_entry(self, sequence: u64) -> Entry {
        let trx_no = match self.trx_no {
            Some(t) => t,
            None => trx_no_for(sequence, self.date),
        };

        Entry {
            sequence,
            trx_no,
            date: self.date,
            account: self.account,
            town: self.town,
            particular: self.particular,
            debit: self.debit,
            credit: self.credit,
            transaction_id: self.transaction_id,
        }
    }
}

/// `TRX-<sequence>-<yy>`, the shape of the numbers cashbook clerks see.
pub fn trx_no_for(sequence: u64, date: Date) -> Arc<str> {
    format!("TRX-{:06}-{:02}", sequence % 1_000_000, date.year().rem_euclid(100)).into()
}
