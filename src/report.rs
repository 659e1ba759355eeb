use std::fmt::{self, Display};

use prettytable::{row, Table};
use rust_decimal::Decimal;
use time::{macros::format_description, Date};

use cashledger_core::{AnnotatedRow, BalanceTone, EntryType};

use crate::projector::{PageView, PrintView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintHeader {
    pub company_name: String,
    pub title: String,
    pub subtitle: String,
    pub date: Date,
}

/// Formats an amount with thousands separators and two decimals.
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, fraction)
}

fn header_row(table: &mut Table) {
    table.add_row(row!["Date", "Trx No", "Account", "Town", "Particular", "Debit", "Credit", "Balance"]);
    table.add_empty_row();
}

fn entry_row(table: &mut Table, row: &AnnotatedRow) {
    let entry = &row.entry;
    let amount = format_money(entry.amount());
    let (debit, credit) = match entry.entry_type() {
        EntryType::Debit => (amount, String::new()),
        EntryType::Credit => (String::new(), amount),
    };
    table.add_row(row![
        entry.date,
        entry.trx_no,
        entry.account,
        entry.town.as_deref().unwrap_or(""),
        entry.particular,
        debit,
        credit,
        format_money(row.running_balance)
    ]);
}

/// The print statement: every filtered row, unpaginated.
pub struct Statement<'a> {
    header: &'a PrintHeader,
    view: &'a PrintView,
}

impl<'a> Statement<'a> {
    pub fn new(header: &'a PrintHeader, view: &'a PrintView) -> Self {
        Self { header, view }
    }
}

impl Display for Statement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self
            .header
            .date
            .format(format_description!("[day] [month repr:long] [year]"))
            .map_err(|_| fmt::Error)?;

        writeln!(f, "{}", self.header.company_name)?;
        writeln!(f, "{}", self.header.title)?;
        writeln!(f, "{}", self.header.subtitle)?;
        writeln!(f, "Date: {}", date)?;
        writeln!(f, "Opening Balance: {}", format_money(self.view.snapshot.opening_balance))?;

        let mut table = Table::new();
        header_row(&mut table);
        for row in &self.view.rows {
            entry_row(&mut table, row);
        }
        table.add_empty_row();

        let snapshot = &self.view.snapshot;
        table.add_row(row![
            "", "", "", "", "Total",
            format_money(snapshot.total_debit),
            format_money(snapshot.total_credit),
            ""
        ]);
        table.add_row(row!["", "", "", "", "Closing Balance", "", "", format_money(snapshot.closing_balance)]);

        write!(f, "\n{}\n", table)
    }
}

impl Display for PageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = Table::new();
        header_row(&mut table);
        for row in &self.rows {
            entry_row(&mut table, row);
        }
        table.add_empty_row();

        let label = match self.snapshot.tone() {
            BalanceTone::Surplus => "Balance",
            BalanceTone::Deficit => "Balance (deficit)",
            BalanceTone::Even => "Balance (even)",
        };
        table.add_row(row![
            label,
            format_money(self.snapshot.net_movement()),
            "", "", "",
            format_money(self.snapshot.total_debit),
            format_money(self.snapshot.total_credit),
            format_money(self.snapshot.closing_balance)
        ]);

        write!(f, "\n{}", table)?;
        writeln!(f, "Page {} of {} ({} rows)", self.page, self.page_count, self.total_rows)
    }
}
