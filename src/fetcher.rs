// Page fetchers
// The pipeline only sees the PageFetcher trait, so a saved page or a test stub
// can stand in for the network

use crate::error::EtlError;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Source of raw page HTML
pub trait PageFetcher {
    /// Return the page body as text
    fn fetch(&self, url: &str) -> Result<String, EtlError>;

    /// Short label for logs
    fn describe(&self) -> String {
        "fetcher".to_string()
    }
}

/// Blocking HTTP GET with a fixed timeout. No retries.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, EtlError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| EtlError::network("failed to build HTTP client", e))?;

        Ok(HttpFetcher { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, EtlError> {
        debug!(url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| EtlError::network(format!("GET {url} failed"), e))?
            .error_for_status()
            .map_err(|e| EtlError::network(format!("GET {url} returned an error status"), e))?;

        response
            .text()
            .map_err(|e| EtlError::network(format!("failed to read body of {url}"), e))
    }

    fn describe(&self) -> String {
        "http".to_string()
    }
}

/// Reads a saved copy of the page; the URL is ignored
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileFetcher { path: path.into() }
    }
}

impl PageFetcher for FileFetcher {
    fn fetch(&self, _url: &str) -> Result<String, EtlError> {
        std::fs::read_to_string(&self.path)
            .map_err(|e| {
                EtlError::io_at("fetch", format!("cannot read HTML file {}", self.path.display()), e)
            })
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_fetcher_reads_saved_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banks.html");
        std::fs::write(&path, "<table><tbody></tbody></table>").unwrap();

        let fetcher = FileFetcher::new(&path);
        let html = fetcher.fetch("https://ignored.example").unwrap();

        assert_eq!(html, "<table><tbody></tbody></table>");
        assert!(fetcher.describe().starts_with("file "));
    }

    #[test]
    fn test_file_fetcher_missing_file_is_fetch_stage_io_error() {
        let fetcher = FileFetcher::new("/definitely/not/here.html");
        let err = fetcher.fetch("").unwrap_err();

        assert!(matches!(err, EtlError::Io { .. }));
        assert_eq!(err.stage(), "fetch");
    }

    #[test]
    fn test_http_fetcher_unusable_url_is_network_error() {
        // Rejected while building the request, before any socket is opened
        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
        let err = fetcher.fetch("not a url").unwrap_err();

        assert!(matches!(err, EtlError::Network { .. }));
        assert_eq!(err.stage(), "fetch");
        assert_eq!(err.exit_code(), 3);
    }
}
