use std::{fmt::Display, str::FromStr, sync::Arc};

use rust_decimal::Decimal;
use time::Date;

use self::write::CreateEntryCommand;

pub mod write;
pub mod read;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    Debit,
    Credit,
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DR" | "DEBIT" => Ok(EntryType::Debit),
            "CR" | "CREDIT" => Ok(EntryType::Credit),
            _ => Err(s.to_string()),
        }
    }
}

impl Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryType::Debit => f.write_str("DR"),
            EntryType::Credit => f.write_str("CR"),
        }
    }
}

/// A single validated ledger line.
///
/// Exactly one of `debit` and `credit` is positive. `sequence` is the
/// insertion order within its book and breaks ties between entries that
/// share a date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    pub sequence: u64,
    pub trx_no: Arc<str>,
    pub date: Date,
    pub account: Arc<str>,
    pub town: Option<Arc<str>>,
    pub particular: Arc<str>,
    pub debit: Decimal,
    pub credit: Decimal,
    /// The journal transaction this entry is one side of. Such entries are
    /// only changed together with the rest of their transaction.
    pub transaction_id: Option<Arc<str>>,
}

impl Entry {
    /// Signed effect on the running balance.
    pub fn net(&self) -> Decimal {
        self.debit - self.credit
    }

    pub fn entry_type(&self) -> EntryType {
        if self.debit > Decimal::ZERO {
            EntryType::Debit
        } else {
            EntryType::Credit
        }
    }

    pub fn amount(&self) -> Decimal {
        self.debit.max(self.credit)
    }

    pub fn ordering_key(&self) -> (Date, u64) {
        (self.date, self.sequence)
    }
}

/// One side of a journal transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JournalLine {
    pub id: Option<u64>,
    pub transaction_id: Arc<str>,
    pub date: Date,
    pub account: Arc<str>,
    pub entry_type: EntryType,
    pub value: Decimal,
    pub description: Arc<str>,
    pub town: Option<Arc<str>>,
}

impl JournalLine {
    /// The cashbook-shaped command this line posts: DR lines debit, CR lines
    /// credit, and the transaction id doubles as the trx number.
    pub fn to_command(&self) -> CreateEntryCommand {
        let (debit, credit) = match self.entry_type {
            EntryType::Debit => (self.value, Decimal::ZERO),
            EntryType::Credit => (Decimal::ZERO, self.value),
        };

        CreateEntryCommand {
            trx_no: Some(self.transaction_id.clone()),
            date: self.date,
            account: self.account.clone(),
            town: self.town.clone(),
            particular: self.description.clone(),
            debit,
            credit,
            transaction_id: Some(self.transaction_id.clone()),
        }
    }
}

/// Journal lines sharing a transaction id whose DR and CR sides balance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transaction {
    pub transaction_id: Arc<str>,
    pub lines: Vec<JournalLine>,
}

impl Transaction {
    pub fn total_debit(&self) -> Decimal {
        self.side_total(EntryType::Debit)
    }

    pub fn total_credit(&self) -> Decimal {
        self.side_total(EntryType::Credit)
    }

    pub fn to_commands(&self) -> Vec<CreateEntryCommand> {
        self.lines.iter().map(JournalLine::to_command).collect()
    }

    fn side_total(&self, side: EntryType) -> Decimal {
        self.lines
            .iter()
            .filter(|l| l.entry_type == side)
            .map(|l| l.value)
            .sum()
    }
}
