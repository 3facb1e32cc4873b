use anyhow::{Context, Result};
use bank_cap_etl::{run_pipeline, EtlConfig, EtlError, FileFetcher, HttpFetcher, PageFetcher, RowPolicy};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Scrape the largest-banks table, convert market caps, and load CSV + SQLite.
#[derive(Parser, Debug)]
#[command(name = "bank-cap-etl", version)]
struct Args {
    /// TOML config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Page to scrape
    #[arg(long)]
    url: Option<String>,

    /// Read the page from a saved HTML file instead of fetching it
    #[arg(long)]
    html_file: Option<PathBuf>,

    /// Exchange rate CSV (Currency,Rate)
    #[arg(long)]
    rates: Option<PathBuf>,

    #[arg(long)]
    csv_out: Option<PathBuf>,

    #[arg(long)]
    db: Option<PathBuf>,

    #[arg(long)]
    table: Option<String>,

    /// Progress log (appended to)
    #[arg(long)]
    log: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Malformed row handling
    #[arg(long, value_enum)]
    row_policy: Option<RowPolicy>,

    /// Print the run report as JSON after the queries
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl Args {
    fn into_config(self) -> Result<(EtlConfig, Option<PathBuf>, bool), EtlError> {
        let mut config = match &self.config {
            Some(path) => EtlConfig::from_toml_file(path)?,
            None => EtlConfig::default(),
        };

        if let Some(url) = self.url {
            config.url = url;
        }
        if let Some(rates) = self.rates {
            config.rates_path = rates;
        }
        if let Some(csv_out) = self.csv_out {
            config.csv_path = csv_out;
        }
        if let Some(db) = self.db {
            config.db_path = db;
        }
        if let Some(table) = self.table {
            config.table_name = table;
        }
        if let Some(log) = self.log {
            config.log_path = log;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(policy) = self.row_policy {
            config.row_policy = policy;
        }

        Ok((config, self.html_file, self.json))
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.downcast_ref::<EtlError>().map_or(70, EtlError::exit_code);
            match err.downcast_ref::<EtlError>() {
                Some(etl) => error!("❌ {} stage failed: {:#}", etl.stage(), err),
                None => error!("❌ {:#}", err),
            }
            ExitCode::from(code)
        }
    }
}

fn run(args: Args) -> Result<()> {
    let (config, html_file, json) = args.into_config()?;

    let fetcher: Box<dyn PageFetcher> = match html_file {
        Some(path) => Box::new(FileFetcher::new(path)),
        None => Box::new(HttpFetcher::new(Duration::from_secs(config.timeout_secs))?),
    };

    println!("🏦 Largest banks ETL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let stdout = std::io::stdout();
    let report = run_pipeline(&config, fetcher.as_ref(), stdout.lock())?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ {} banks loaded into table {}", report.rows, report.table_name);
    if report.skipped_rows > 0 {
        println!("⚠️  Skipped malformed rows: {}", report.skipped_rows);
    }
    println!("✓ CSV: {} (sha256 {})", report.csv_path.display(), report.csv_sha256);

    if json {
        let text = serde_json::to_string_pretty(&report).context("failed to serialize run report")?;
        println!("{text}");
    }

    Ok(())
}
