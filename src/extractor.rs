// Table Extractor
// Turns the bank list page into ScrapedBank rows, in page order
//
// Expected row shape (Wikipedia "List of largest banks"):
//   <tr><td>rank</td><td><a>flag</a> <a title="Bank">Bank</a></td><td>432.92\n</td></tr>
// Header rows carry only <th> cells and are skipped.

use crate::error::EtlError;
use crate::model::{ScrapedBank, INPUT_COLUMNS};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ============================================================================
// POLICY & OUTPUT
// ============================================================================

/// What to do with a data row that lacks the expected structure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// Abort the run with an extraction error
    #[default]
    Strict,
    /// Drop the row, log a warning, keep going
    Skip,
}

/// Result of one extraction pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub rows: Vec<ScrapedBank>,
    /// Malformed rows dropped under `RowPolicy::Skip`
    pub skipped: usize,
}

// ============================================================================
// EXTRACTOR
// ============================================================================

struct Selectors {
    tbody: Selector,
    tr: Selector,
    td: Selector,
    a: Selector,
}

impl Selectors {
    fn new() -> Result<Self, EtlError> {
        Ok(Selectors {
            tbody: selector("tbody")?,
            tr: selector("tr")?,
            td: selector("td")?,
            a: selector("a")?,
        })
    }
}

fn selector(css: &str) -> Result<Selector, EtlError> {
    Selector::parse(css).map_err(|e| EtlError::extraction(format!("bad selector '{css}': {e:?}")))
}

pub struct TableExtractor {
    policy: RowPolicy,
}

impl TableExtractor {
    /// The caller names the columns it expects; anything other than
    /// `Name, MC_USD_Billion` is a configuration mistake.
    pub fn new(columns: &[&str]) -> Result<Self, EtlError> {
        if columns != INPUT_COLUMNS {
            return Err(EtlError::config(format!(
                "extractor columns must be {:?}, got {:?}",
                INPUT_COLUMNS, columns
            )));
        }
        Ok(TableExtractor {
            policy: RowPolicy::Strict,
        })
    }

    pub fn with_policy(mut self, policy: RowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Parse the page and collect one row per data row of the first `<tbody>`
    pub fn extract(&self, html: &str) -> Result<Extraction, EtlError> {
        let selectors = Selectors::new()?;
        let document = Html::parse_document(html);

        let tbody = document
            .select(&selectors.tbody)
            .next()
            .ok_or_else(|| EtlError::extraction("page has no <tbody> element"))?;

        let mut extraction = Extraction::default();

        for (index, row) in tbody.select(&selectors.tr).enumerate() {
            let cells: Vec<ElementRef> = row.select(&selectors.td).collect();
            if cells.is_empty() {
                // header row
                continue;
            }

            match parse_row(&cells, &selectors) {
                Ok(bank) => extraction.rows.push(bank),
                Err(reason) => match self.policy {
                    RowPolicy::Strict => {
                        return Err(EtlError::extraction(format!("row {}: {reason}", index + 1)));
                    }
                    RowPolicy::Skip => {
                        warn!(row = index + 1, %reason, "skipping malformed row");
                        extraction.skipped += 1;
                    }
                },
            }
        }

        debug!(
            rows = extraction.rows.len(),
            skipped = extraction.skipped,
            "extraction finished"
        );
        Ok(extraction)
    }
}

/// Strict extraction with the standard column set
pub fn extract(html: &str, columns: &[&str]) -> Result<Vec<ScrapedBank>, EtlError> {
    Ok(TableExtractor::new(columns)?.extract(html)?.rows)
}

// ============================================================================
// ROW PARSING
// ============================================================================

fn parse_row(cells: &[ElementRef], selectors: &Selectors) -> Result<ScrapedBank, String> {
    let name_cell = cells
        .get(1)
        .ok_or_else(|| format!("expected at least 3 cells, found {}", cells.len()))?;
    let value_cell = cells
        .get(2)
        .ok_or_else(|| format!("expected at least 3 cells, found {}", cells.len()))?;

    let link = name_cell
        .select(&selectors.a)
        .nth(1)
        .ok_or("name cell has fewer than 2 links")?;
    let name = link
        .value()
        .attr("title")
        .ok_or("bank link has no title attribute")?;

    let mc_usd_billion = parse_market_cap(value_cell)?;

    Ok(ScrapedBank::new(name, mc_usd_billion))
}

/// First text node of the cell, newlines removed
fn parse_market_cap(cell: &ElementRef) -> Result<f64, String> {
    let raw = cell.text().next().ok_or("market cap cell is empty")?;
    let cleaned = raw.replace('\n', "");
    let cleaned = cleaned.trim();

    let value: f64 = cleaned
        .parse()
        .map_err(|_| format!("market cap '{cleaned}' is not a number"))?;

    if !value.is_finite() || value < 0.0 {
        return Err(format!("market cap '{cleaned}' is out of range"));
    }
    Ok(value)
}
