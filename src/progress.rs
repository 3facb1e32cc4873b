// Progress Logger
// Appends "<timestamp> : <message>" lines to the run log, e.g.
//   2023-Sep-08-09:16:35 : Data saved to CSV file.
// An append failure is reported through tracing and never aborts the run.

use chrono::{Local, NaiveDateTime};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

pub const TIMESTAMP_FORMAT: &str = "%Y-%b-%d-%H:%M:%S";

/// Format one log line (without the trailing newline)
pub fn format_line(timestamp: NaiveDateTime, message: &str) -> String {
    format!("{} : {}", timestamp.format(TIMESTAMP_FORMAT), message)
}

#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: PathBuf,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ProgressLog { path: path.into() }
    }

    /// Record a completed stage. Opens, appends and closes the file per call.
    pub fn log_progress(&self, message: &str) {
        info!("{message}");

        if let Err(e) = self.append(&format_line(Local::now().naive_local(), message)) {
            warn!(path = %self.path.display(), error = %e, "could not append to progress log");
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")
    }
}
