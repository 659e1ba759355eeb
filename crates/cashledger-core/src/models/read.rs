use std::sync::Arc;

use rust_decimal::Decimal;

use crate::error::ValidationError;

use super::Entry;

/// An entry together with the balance after applying it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotatedRow {
    pub entry: Entry,
    pub running_balance: Decimal,
}

/// Totals over a visible entry set. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LedgerSnapshot {
    pub opening_balance: Decimal,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub closing_balance: Decimal,
}

impl LedgerSnapshot {
    pub fn new(opening_balance: Decimal, total_debit: Decimal, total_credit: Decimal) -> Self {
        Self {
            opening_balance,
            total_debit,
            total_credit,
            closing_balance: opening_balance + total_debit - total_credit,
        }
    }

    pub fn empty(opening_balance: Decimal) -> Self {
        Self::new(opening_balance, Decimal::ZERO, Decimal::ZERO)
    }

    /// Debits less credits, ignoring the opening balance.
    pub fn net_movement(&self) -> Decimal {
        self.total_debit - self.total_credit
    }

    pub fn tone(&self) -> BalanceTone {
        BalanceTone::of(self.net_movement())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BalanceTone {
    Surplus,
    Deficit,
    Even,
}

impl BalanceTone {
    pub fn of(amount: Decimal) -> Self {
        if amount > Decimal::ZERO {
            BalanceTone::Surplus
        } else if amount < Decimal::ZERO {
            BalanceTone::Deficit
        } else {
            BalanceTone::Even
        }
    }
}

/// A raw record that was left out of a batch, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Zero-based position of the record in the submitted batch.
    pub position: usize,
    pub trx_no: Option<Arc<str>>,
    pub error: ValidationError,
}
