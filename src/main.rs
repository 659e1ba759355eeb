use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cashledger::{
    config::{CliArgs, Config, LoggingConfig},
    error::LedgerError,
    ledger::LedgerBook,
    report::{PrintHeader, Statement},
    storage::{InMemoryStorage, StorageBackend},
};
use cashledger_core::{RawEntry, RawJournalLine};

fn main() {
    let cli = CliArgs::parse();
    let config = Config::load(&cli);
    init_tracing(&config.logging);

    if let Err(e) = run(&cli, &config) {
        tracing::error!(error = %e, "cashledger failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: &CliArgs, config: &Config) -> Result<(), LedgerError> {
    let storage: Arc<dyn StorageBackend> = Arc::new(InMemoryStorage::new());
    let book = LedgerBook::new(storage, &config.ledger.book, config.ledger.failure_policy)?;
    book.set_opening_balance(config.ledger.opening_balance)?;
    tracing::info!(book = book.book_id(), policy = ?book.policy(), input = %cli.input.display(), "Loading records");

    let contents = std::fs::read_to_string(&cli.input)?;
    let rejections = if cli.journal {
        let lines: Vec<RawJournalLine> = serde_json::from_str(&contents)?;
        book.post_journal_lines(&lines)?
    } else {
        let entries: Vec<RawEntry> = serde_json::from_str(&contents)?;
        book.record_batch(&entries)?
    };
    for rejection in &rejections {
        eprintln!("Skipped record {}: {}", rejection.position + 1, rejection.error);
    }

    let filter = cli.filter()?;
    if cli.print {
        let header = PrintHeader {
            company_name: config.print.company_name.clone(),
            title: config.print.title.clone(),
            subtitle: config.print.subtitle.clone(),
            date: time::OffsetDateTime::now_utc().date(),
        };
        let view = book.print(&filter)?;
        print!("{}", Statement::new(&header, &view));
    } else {
        let view = book.page(&filter, &cli.page_request(config))?;
        print!("{}", view);
    }

    Ok(())
}
