// Pipeline orchestration
// fetch -> extract -> transform -> CSV -> SQLite -> fixed queries -> close
//
// Strictly linear: the first error aborts the remaining stages. Each completed
// stage leaves one line in the progress log.

use crate::config::EtlConfig;
use crate::csv_sink::{csv_digest, write_csv};
use crate::db::BankStore;
use crate::error::EtlError;
use crate::extractor::TableExtractor;
use crate::fetcher::PageFetcher;
use crate::model::INPUT_COLUMNS;
use crate::progress::ProgressLog;
use crate::query::{fixed_queries, QueryRunner, ResultSet};
use crate::rates::RateTable;
use crate::transform::transform;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// Summary of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub rows: usize,
    pub skipped_rows: usize,
    pub csv_path: PathBuf,
    pub csv_sha256: String,
    pub table_name: String,
    pub queries: Vec<ResultSet>,
}

pub struct Pipeline<'a, W: Write> {
    config: &'a EtlConfig,
    fetcher: &'a dyn PageFetcher,
    out: W,
    log: ProgressLog,
}

impl<'a, W: Write> Pipeline<'a, W> {
    /// Validates the configuration; nothing is fetched or written yet
    pub fn new(config: &'a EtlConfig, fetcher: &'a dyn PageFetcher, out: W) -> Result<Self, EtlError> {
        config.validate()?;

        Ok(Pipeline {
            config,
            fetcher,
            out,
            log: ProgressLog::new(&config.log_path),
        })
    }

    pub fn run(&mut self) -> Result<RunReport, EtlError> {
        let config = self.config;
        self.log.log_progress("Preliminaries complete. Initiating ETL process");

        // Extract
        debug!(source = %self.fetcher.describe(), url = %config.url, "fetching page");
        let html = self.fetcher.fetch(&config.url)?;
        let extraction = TableExtractor::new(&INPUT_COLUMNS)?
            .with_policy(config.row_policy)
            .extract(&html)?;
        info!(rows = extraction.rows.len(), skipped = extraction.skipped, "rows extracted");
        self.log
            .log_progress("Data extraction complete. Initiating Transformation process");

        // Transform
        let rates = RateTable::load(&config.rates_path)?;
        let table = transform(extraction.rows, &rates);
        self.log
            .log_progress("Data transformation complete. Initiating Loading process");

        // Load: CSV
        write_csv(&table, &config.csv_path)?;
        let csv_sha256 = csv_digest(&config.csv_path)?;
        debug!(path = %config.csv_path.display(), sha256 = %csv_sha256, "CSV written");
        self.log.log_progress("Data saved to CSV file.");

        // Load: SQLite. The store is released on drop if anything below fails.
        let mut store = BankStore::open(&config.db_path)?;
        self.log.log_progress("SQL Connection initiated");

        store.write_table(&table, &config.table_name)?;
        self.log
            .log_progress("Data loaded to Database as a table, Executing queries");

        let mut runner = QueryRunner::new(&mut self.out);
        let mut queries = Vec::with_capacity(3);
        for sql in fixed_queries(&config.table_name) {
            queries.push(runner.run_query(&sql, &store)?);
        }
        self.log.log_progress("Process Complete");

        store.close()?;
        self.log.log_progress("Server Connection closed");

        Ok(RunReport {
            rows: table.len(),
            skipped_rows: extraction.skipped,
            csv_path: config.csv_path.clone(),
            csv_sha256,
            table_name: config.table_name.clone(),
            queries,
        })
    }
}

/// One-shot helper for callers that don't need the builder
pub fn run_pipeline<W: Write>(
    config: &EtlConfig,
    fetcher: &dyn PageFetcher,
    out: W,
) -> Result<RunReport, EtlError> {
    Pipeline::new(config, fetcher, out)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_sink::read_csv;
    use crate::extractor::RowPolicy;
    use crate::fetcher::FileFetcher;
    use std::path::Path;

    struct StubFetcher {
        html: String,
    }

    impl PageFetcher for StubFetcher {
        fn fetch(&self, _url: &str) -> Result<String, EtlError> {
            Ok(self.html.clone())
        }
    }

    fn page(banks: &[(&str, &str)]) -> String {
        let rows: String = banks
            .iter()
            .enumerate()
            .map(|(i, (name, cap))| {
                format!(
                    "<tr><td>{}</td><td><a href=\"#\"><img></a> <a href=\"#\" title=\"{name}\">{name}</a></td><td>{cap}\n</td></tr>",
                    i + 1
                )
            })
            .collect();
        format!(
            "<html><body><table><tbody><tr><th>Rank</th><th>Bank name</th><th>Market cap</th></tr>{rows}</tbody></table></body></html>"
        )
    }

    fn config_in(dir: &Path) -> EtlConfig {
        let rates_path = dir.join("exchange_rate.csv");
        std::fs::write(&rates_path, "Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.95\n").unwrap();

        EtlConfig {
            rates_path,
            csv_path: dir.join("Largest_banks_data.csv"),
            db_path: dir.join("Banks.db"),
            log_path: dir.join("code_log.txt"),
            ..EtlConfig::default()
        }
    }

    #[test]
    fn test_full_run_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let fetcher = StubFetcher {
            html: page(&[("Bank A", "100.0"), ("Bank B", "50.0")]),
        };
        let mut out = Vec::new();

        let report = run_pipeline(&config, &fetcher, &mut out).unwrap();

        assert_eq!(report.rows, 2);
        assert_eq!(report.skipped_rows, 0);

        let csv = read_csv(&config.csv_path).unwrap();
        assert_eq!(csv.names(), vec!["Bank A", "Bank B"]);
        assert_eq!(csv.records()[0].mc_inr_billion, 8295.0);

        let store = BankStore::open(&config.db_path).unwrap();
        assert_eq!(store.load_table("Largest_banks").unwrap(), csv);

        // Fixed queries, fixed order
        assert_eq!(report.queries.len(), 3);
        assert_eq!(report.queries[0].len(), 2);
        assert_eq!(report.queries[1].scalar_f64(), Some(60.0));
        assert_eq!(report.queries[2].column_text(0), vec!["Bank A", "Bank B"]);

        let printed = String::from_utf8(out).unwrap();
        let dump = printed.find("SELECT * FROM \"Largest_banks\"").unwrap();
        let avg = printed.find("SELECT AVG(MC_GBP_Billion) FROM \"Largest_banks\"").unwrap();
        let names = printed.find("SELECT Name from \"Largest_banks\" LIMIT 5").unwrap();
        assert!(dump < avg && avg < names, "Queries print in fixed order");

        let log = std::fs::read_to_string(&config.log_path).unwrap();
        let messages: Vec<&str> = log.lines().filter_map(|l| l.split(" : ").nth(1)).collect();
        assert_eq!(
            messages,
            vec![
                "Preliminaries complete. Initiating ETL process",
                "Data extraction complete. Initiating Transformation process",
                "Data transformation complete. Initiating Loading process",
                "Data saved to CSV file.",
                "SQL Connection initiated",
                "Data loaded to Database as a table, Executing queries",
                "Process Complete",
                "Server Connection closed",
            ]
        );
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let fetcher = StubFetcher {
            html: page(&[("Bank A", "100.0"), ("Bank B", "50.0"), ("Bank C", "25.5")]),
        };

        let first = run_pipeline(&config, &fetcher, std::io::sink()).unwrap();
        let first_csv = std::fs::read(&config.csv_path).unwrap();
        let second = run_pipeline(&config, &fetcher, std::io::sink()).unwrap();
        let second_csv = std::fs::read(&config.csv_path).unwrap();

        assert_eq!(first_csv, second_csv, "CSV must be byte-identical");
        assert_eq!(first.csv_sha256, second.csv_sha256);

        let store = BankStore::open(&config.db_path).unwrap();
        assert_eq!(store.row_count("Largest_banks").unwrap(), 3, "Table replaced, not appended");
    }

    #[test]
    fn test_first_five_is_page_order_not_rank() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let fetcher = StubFetcher {
            html: page(&[
                ("Bank 1", "10.0"),
                ("Bank 2", "700.0"),
                ("Bank 3", "30.0"),
                ("Bank 4", "500.0"),
                ("Bank 5", "20.0"),
                ("Bank 6", "900.0"),
                ("Bank 7", "40.0"),
            ]),
        };

        let report = run_pipeline(&config, &fetcher, std::io::sink()).unwrap();

        assert_eq!(
            report.queries[2].column_text(0),
            vec!["Bank 1", "Bank 2", "Bank 3", "Bank 4", "Bank 5"]
        );
    }

    #[test]
    fn test_keyword_table_name_passes_validation_and_runs() {
        let dir = tempfile::tempdir().unwrap();
        let config = EtlConfig {
            table_name: "order".to_string(),
            ..config_in(dir.path())
        };
        assert!(config.validate().is_ok());
        let fetcher = StubFetcher {
            html: page(&[("Bank A", "100.0"), ("Bank B", "50.0")]),
        };

        let report = run_pipeline(&config, &fetcher, std::io::sink()).unwrap();

        assert_eq!(report.table_name, "order");
        assert_eq!(report.queries[1].scalar_f64(), Some(60.0));
        assert_eq!(report.queries[2].column_text(0), vec!["Bank A", "Bank B"]);
    }

    #[test]
    fn test_missing_html_file_is_reported_as_fetch_stage() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let fetcher = FileFetcher::new(dir.path().join("no_such_page.html"));

        let err = run_pipeline(&config, &fetcher, std::io::sink()).unwrap_err();

        assert!(matches!(err, EtlError::Io { .. }));
        assert_eq!(err.stage(), "fetch");
        assert_eq!(err.exit_code(), 5);
        assert!(!config.csv_path.exists());
    }

    #[test]
    fn test_extraction_failure_stops_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let fetcher = StubFetcher {
            html: "<html><body>maintenance</body></html>".to_string(),
        };

        let err = run_pipeline(&config, &fetcher, std::io::sink()).unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert!(!config.csv_path.exists());
        assert!(!config.db_path.exists());

        let log = std::fs::read_to_string(&config.log_path).unwrap();
        assert_eq!(log.lines().count(), 1, "Only the preliminaries line is logged");
    }

    #[test]
    fn test_missing_rate_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = EtlConfig {
            rates_path: dir.path().join("missing.csv"),
            ..config_in(dir.path())
        };
        let fetcher = StubFetcher {
            html: page(&[("Bank A", "100.0")]),
        };

        let err = run_pipeline(&config, &fetcher, std::io::sink()).unwrap_err();

        assert!(matches!(err, EtlError::Config { .. }));
        assert!(!config.csv_path.exists(), "No CSV without a successful transform");
    }

    #[test]
    fn test_skip_policy_drops_malformed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let config = EtlConfig {
            row_policy: RowPolicy::Skip,
            ..config_in(dir.path())
        };
        let mut html = page(&[("Bank A", "100.0"), ("Bank B", "n/a")]);
        html = html.replace("</tbody>", "<tr><td>3</td><td>no links</td><td>1.0</td></tr></tbody>");
        let fetcher = StubFetcher { html };

        let report = run_pipeline(&config, &fetcher, std::io::sink()).unwrap();

        assert_eq!(report.rows, 1);
        assert_eq!(report.skipped_rows, 2);
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let config = EtlConfig {
            table_name: "bad name".to_string(),
            ..config_in(dir.path())
        };
        let fetcher = StubFetcher { html: page(&[]) };

        let result = Pipeline::new(&config, &fetcher, std::io::sink());

        assert!(matches!(result, Err(EtlError::Config { .. })));
        assert!(!config.log_path.exists(), "Nothing runs before validation passes");
    }
}
