// Bank Market Cap ETL - Core Library
// Exposes the pipeline stages for the CLI and tests

pub mod config;
pub mod csv_sink;
pub mod db;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod query;
pub mod rates;
pub mod transform;

// Re-export commonly used types
pub use config::EtlConfig;
pub use csv_sink::{csv_digest, read_csv, write_csv};
pub use db::BankStore;
pub use error::EtlError;
pub use extractor::{extract, Extraction, RowPolicy, TableExtractor};
pub use fetcher::{FileFetcher, HttpFetcher, PageFetcher};
pub use model::{BankRecord, BankTable, ScrapedBank, TargetCurrency, INPUT_COLUMNS, OUTPUT_COLUMNS};
pub use pipeline::{run_pipeline, Pipeline, RunReport};
pub use progress::ProgressLog;
pub use query::{fixed_queries, QueryRunner, ResultSet};
pub use rates::RateTable;
pub use transform::{round2, transform};
