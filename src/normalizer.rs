use std::{collections::HashMap, str::FromStr, sync::Arc};

use rust_decimal::Decimal;
use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime, UtcOffset};

use cashledger_core::{
    CreateEntryCommand, EntryType, JournalForm, JournalLine, RawAmount, RawEntry, RawJournalLine,
    Rejection, Transaction, ValidationError,
};

use crate::{accumulator::FailurePolicy, error::LedgerError};

/// Validates one cashbook record.
pub fn normalize(raw: &RawEntry) -> Result<CreateEntryCommand, ValidationError> {
    let date = parse_date("date", raw.date.as_deref())?;
    let account = required_text("account", raw.account.as_deref())?;
    let particular = required_text("particular", raw.particular.as_deref())?;
    let debit = parse_amount("debit", raw.debit.as_ref())?;
    let credit = parse_amount("credit", raw.credit.as_ref())?;

    if (debit > Decimal::ZERO) == (credit > Decimal::ZERO) {
        return Err(ValidationError::UnbalancedEntry { debit, credit });
    }

    Ok(CreateEntryCommand {
        trx_no: optional_text(raw.trx_no.as_deref()),
        date,
        account,
        town: optional_text(raw.town.as_deref()),
        particular,
        debit,
        credit,
        transaction_id: None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedBatch {
    /// Valid commands with their position in the submitted batch.
    pub commands: Vec<(usize, CreateEntryCommand)>,
    pub rejections: Vec<Rejection>,
}

/// Validates a batch of cashbook records under `policy`.
pub fn normalize_batch(raws: &[RawEntry], policy: FailurePolicy) -> Result<NormalizedBatch, LedgerError> {
    let mut batch = NormalizedBatch::default();
    for (position, raw) in raws.iter().enumerate() {
        match normalize(raw) {
            Ok(command) => batch.commands.push((position, command)),
            Err(error) => {
                let rejection = Rejection {
                    position,
                    trx_no: optional_text(raw.trx_no.as_deref()),
                    error,
                };
                reject(policy, rejection, &mut batch.rejections)?;
            }
        }
    }
    Ok(batch)
}

pub fn normalize_journal_line(raw: &RawJournalLine) -> Result<JournalLine, ValidationError> {
    let transaction_id = required_text("transaction id", raw.transaction_id.as_deref())?;
    let date = parse_date("date", raw.date.as_deref())?;
    let account = required_text("account", raw.account.as_deref())?;
    let entry_type = match raw.entry_type.as_deref() {
        Some(t) if !t.trim().is_empty() => EntryType::from_str(t).map_err(ValidationError::InvalidEntryType)?,
        _ => return Err(ValidationError::MissingField("entry type")),
    };
    let value = parse_amount("value", raw.value.as_ref())?;
    if value.is_zero() {
        return Err(ValidationError::UnbalancedEntry { debit: Decimal::ZERO, credit: Decimal::ZERO });
    }

    Ok(JournalLine {
        id: raw.id,
        transaction_id,
        date,
        account,
        entry_type,
        value,
        description: optional_text(raw.description.as_deref()).unwrap_or_else(|| Arc::from("")),
        town: optional_text(raw.town.as_deref()),
    })
}

/// Checks that the lines of one transaction have both sides and that the
/// sides sum to the same value.
pub fn validate_transaction(transaction_id: &str, lines: Vec<JournalLine>) -> Result<Transaction, ValidationError> {
    let transaction = Transaction {
        transaction_id: Arc::from(transaction_id),
        lines,
    };
    let debits = transaction.total_debit();
    let credits = transaction.total_credit();
    if debits.is_zero() || credits.is_zero() || debits != credits {
        return Err(ValidationError::UnbalancedTransaction {
            transaction_id: transaction_id.to_string(),
            debits,
            credits,
        });
    }
    Ok(transaction)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedJournal {
    /// Balanced transactions in the order their first line appeared.
    pub transactions: Vec<Transaction>,
    pub rejections: Vec<Rejection>,
}

/// Groups journal rows by transaction id and validates each group. A bad
/// row takes its whole transaction down with it.
pub fn normalize_journal(raws: &[RawJournalLine], policy: FailurePolicy) -> Result<NormalizedJournal, LedgerError> {
    let mut result = NormalizedJournal::default();
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (position, raw) in raws.iter().enumerate() {
        match raw.transaction_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => {
                let slot = *index.entry(id.to_string()).or_insert_with(|| {
                    groups.push((id.to_string(), Vec::new()));
                    groups.len() - 1
                });
                groups[slot].1.push(position);
            }
            None => {
                let rejection = Rejection {
                    position,
                    trx_no: None,
                    error: ValidationError::MissingField("transaction id"),
                };
                reject(policy, rejection, &mut result.rejections)?;
            }
        }
    }

    for (transaction_id, positions) in groups {
        let trx_no: Option<Arc<str>> = Some(Arc::from(transaction_id.as_str()));
        let mut lines = Vec::with_capacity(positions.len());
        let mut failed = None;
        for &position in &positions {
            match normalize_journal_line(&raws[position]) {
                Ok(line) => lines.push(line),
                Err(error) => {
                    failed = Some(Rejection { position, trx_no: trx_no.clone(), error });
                    break;
                }
            }
        }

        let outcome = match failed {
            Some(rejection) => Err(rejection),
            None => validate_transaction(&transaction_id, lines).map_err(|error| Rejection {
                position: positions[0],
                trx_no,
                error,
            }),
        };

        match outcome {
            Ok(transaction) => result.transactions.push(transaction),
            Err(rejection) => reject(policy, rejection, &mut result.rejections)?,
        }
    }

    Ok(result)
}

/// Turns the add-journal form into its DR/CR pair.
pub fn journal_form(form: &JournalForm) -> Result<Transaction, ValidationError> {
    let transaction_id = required_text("transaction id", form.transaction_id.as_deref())?;
    let date = parse_date("date", form.date.as_deref())?;
    let debit_account = required_text("debit account", form.debit_account.as_deref())?;
    let credit_account = required_text("credit account", form.credit_account.as_deref())?;
    let description = required_text("description", form.description.as_deref())?;
    let amount = parse_amount("amount", form.amount.as_ref())?;
    if amount.is_zero() {
        return Err(ValidationError::UnbalancedEntry { debit: Decimal::ZERO, credit: Decimal::ZERO });
    }
    let town = optional_text(form.town.as_deref());

    let line = |account: Arc<str>, entry_type: EntryType| JournalLine {
        id: None,
        transaction_id: transaction_id.clone(),
        date,
        account,
        entry_type,
        value: amount,
        description: description.clone(),
        town: town.clone(),
    };

    validate_transaction(
        &transaction_id,
        vec![line(debit_account, EntryType::Debit), line(credit_account, EntryType::Credit)],
    )
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, keeping the UTC calendar
/// date of the latter.
pub fn parse_date(field: &'static str, value: Option<&str>) -> Result<Date, ValidationError> {
    let value = match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return Err(ValidationError::MissingField(field)),
    };

    if let Ok(date) = Date::parse(value, format_description!("[year]-[month]-[day]")) {
        return Ok(date);
    }
    OffsetDateTime::parse(value, &Rfc3339)
        .map(|dt| dt.to_offset(UtcOffset::UTC).date())
        .map_err(|_| ValidationError::InvalidDate { field, value: value.to_string() })
}

/// Largest amount a single entry or opening balance may carry. Keeps
/// running totals well inside `Decimal` range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Rejects an opening balance whose magnitude exceeds [`MAX_AMOUNT`].
pub fn check_opening_balance(balance: Decimal) -> Result<Decimal, ValidationError> {
    if balance.abs() > MAX_AMOUNT {
        return Err(ValidationError::AmountOutOfRange { field: "opening balance", value: balance });
    }
    Ok(balance)
}

/// Missing or blank amounts count as zero, the same default the entry forms
/// use. Thousands separators are tolerated.
pub fn parse_amount(field: &'static str, value: Option<&RawAmount>) -> Result<Decimal, ValidationError> {
    let raw = match value {
        Some(raw) => raw,
        None => return Ok(Decimal::ZERO),
    };
    let invalid = || ValidationError::InvalidAmount { field, value: raw.to_string() };

    let amount = match raw {
        RawAmount::Int(i) => Decimal::from(*i),
        RawAmount::Float(f) if f.is_finite() => Decimal::from_str(&f.to_string()).map_err(|_| invalid())?,
        RawAmount::Float(_) => return Err(invalid()),
        RawAmount::Text(s) => {
            let cleaned = s.trim().replace(',', "");
            if cleaned.is_empty() {
                return Ok(Decimal::ZERO);
            }
            Decimal::from_str(&cleaned).map_err(|_| invalid())?
        }
    };

    let amount = amount.normalize();
    if amount < Decimal::ZERO || amount.scale() > 2 {
        return Err(invalid());
    }
    if amount > MAX_AMOUNT {
        return Err(ValidationError::AmountOutOfRange { field, value: amount });
    }
    Ok(amount)
}

fn required_text(field: &'static str, value: Option<&str>) -> Result<Arc<str>, ValidationError> {
    optional_text(value).ok_or(ValidationError::MissingField(field))
}

fn optional_text(value: Option<&str>) -> Option<Arc<str>> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(Arc::from)
}

fn reject(policy: FailurePolicy, rejection: Rejection, rejections: &mut Vec<Rejection>) -> Result<(), LedgerError> {
    match policy {
        FailurePolicy::Abort => Err(LedgerError::Rejected {
            position: rejection.position,
            error: rejection.error,
        }),
        FailurePolicy::Skip => {
            tracing::warn!(
                position = rejection.position,
                trx_no = rejection.trx_no.as_deref().unwrap_or("-"),
                error = %rejection.error,
                "Skipping invalid record"
            );
            metrics::increment_counter!("cashledger_records_rejected_total");
            rejections.push(rejection);
            Ok(())
        }
    }
}
