use std::{ops::Bound, path::PathBuf};

use clap::Parser;
use rust_decimal::Decimal;
use serde::Deserialize;

use cashledger_core::ValidationError;

use crate::{
    accumulator::FailurePolicy,
    filter::LedgerFilter,
    normalizer::parse_date,
    projector::{PageRequest, SortDirection, SortKey, DEFAULT_PAGE_SIZE},
};

#[derive(Parser, Debug)]
#[command(name = "cashledger", about = "Cashbook and journal balances from ledger records")]
pub struct CliArgs {
    /// Path to config file
    #[arg(short, long, default_value = "cashledger.toml")]
    pub config: String,

    /// JSON file of cashbook records, or journal rows with --journal
    #[arg(short, long)]
    pub input: PathBuf,

    /// Treat the input as journal rows grouped by transaction id
    #[arg(long)]
    pub journal: bool,

    /// First date shown (YYYY-MM-DD); earlier entries roll into the opening balance
    #[arg(long)]
    pub from: Option<String>,

    /// Last date shown (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    #[arg(long)]
    pub account: Option<String>,

    #[arg(long)]
    pub town: Option<String>,

    /// Case-insensitive text over trx no, account and particular
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Rows per page (overrides config file)
    #[arg(long)]
    pub page_size: Option<usize>,

    #[arg(long, value_enum, default_value_t = SortKey::Ledger)]
    pub sort: SortKey,

    #[arg(long)]
    pub desc: bool,

    /// Render the full statement instead of a table page
    #[arg(long)]
    pub print: bool,

    /// Opening balance (overrides config file)
    #[arg(long)]
    pub opening_balance: Option<Decimal>,

    /// Log level (overrides config file)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

impl CliArgs {
    pub fn filter(&self) -> Result<LedgerFilter, ValidationError> {
        let from = match self.from.as_deref() {
            Some(value) => Bound::Included(parse_date("from", Some(value))?),
            None => Bound::Unbounded,
        };
        let to = match self.to.as_deref() {
            Some(value) => Bound::Included(parse_date("to", Some(value))?),
            None => Bound::Unbounded,
        };

        let mut filter = LedgerFilter::new().between(from, to);
        if let Some(account) = self.account.as_deref() {
            filter = filter.account(account);
        }
        if let Some(town) = self.town.as_deref() {
            filter = filter.town(town);
        }
        if let Some(search) = self.search.as_deref() {
            filter = filter.search(search);
        }
        Ok(filter)
    }

    pub fn page_request(&self, config: &Config) -> PageRequest {
        let direction = if self.desc { SortDirection::Descending } else { SortDirection::Ascending };
        PageRequest::new(self.page, config.table.page_size).sorted(self.sort, direction)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub table: TableConfig,

    #[serde(default)]
    pub print: PrintConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    #[serde(default = "default_book")]
    pub book: String,

    #[serde(default)]
    pub opening_balance: Decimal,

    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TableConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PrintConfig {
    #[serde(default = "default_company_name")]
    pub company_name: String,

    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_subtitle")]
    pub subtitle: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            book: default_book(),
            opening_balance: Decimal::ZERO,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            company_name: default_company_name(),
            title: default_title(),
            subtitle: default_subtitle(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_book() -> String {
    cashledger_memory::DEFAULT_BOOK.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_company_name() -> String {
    "ABC Traders".to_string()
}

fn default_title() -> String {
    "Cashbook".to_string()
}

fn default_subtitle() -> String {
    "Debit / Credit Summary".to_string()
}

impl Config {
    pub fn load(cli: &CliArgs) -> Self {
        let mut config = match std::fs::read_to_string(&cli.config) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Config::default()
            }),
            Err(_) => Config::default(),
        };

        // CLI overrides
        if let Some(ref level) = cli.log_level {
            config.logging.level = level.clone();
        }
        if let Some(page_size) = cli.page_size {
            config.table.page_size = page_size;
        }
        if let Some(opening_balance) = cli.opening_balance {
            config.ledger.opening_balance = opening_balance;
        }

        config
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}
