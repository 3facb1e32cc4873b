use serde::{Deserialize, Serialize};

/// Input columns the extractor fills, in page order
pub const INPUT_COLUMNS: [&str; 2] = ["Name", "MC_USD_Billion"];

/// Output columns, in the order both sinks persist them
pub const OUTPUT_COLUMNS: [&str; 5] = [
    "Name",
    "MC_USD_Billion",
    "MC_GBP_Billion",
    "MC_EUR_Billion",
    "MC_INR_Billion",
];

/// Currencies the transformer converts market cap into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetCurrency {
    Gbp,
    Eur,
    Inr,
}

impl TargetCurrency {
    pub const ALL: [TargetCurrency; 3] = [TargetCurrency::Gbp, TargetCurrency::Eur, TargetCurrency::Inr];

    /// ISO code as it appears in the rate file
    pub fn code(&self) -> &'static str {
        match self {
            TargetCurrency::Gbp => "GBP",
            TargetCurrency::Eur => "EUR",
            TargetCurrency::Inr => "INR",
        }
    }

    /// Output column holding this currency's value
    pub fn column(&self) -> &'static str {
        match self {
            TargetCurrency::Gbp => "MC_GBP_Billion",
            TargetCurrency::Eur => "MC_EUR_Billion",
            TargetCurrency::Inr => "MC_INR_Billion",
        }
    }
}

/// One row as scraped from the page, before conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedBank {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "MC_USD_Billion")]
    pub mc_usd_billion: f64,
}

impl ScrapedBank {
    pub fn new(name: impl Into<String>, mc_usd_billion: f64) -> Self {
        ScrapedBank {
            name: name.into(),
            mc_usd_billion,
        }
    }
}

/// Final row: scraped values plus the converted market caps.
///
/// Field order here is the serialization order, so it must match
/// `OUTPUT_COLUMNS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRecord {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "MC_USD_Billion")]
    pub mc_usd_billion: f64,

    #[serde(rename = "MC_GBP_Billion")]
    pub mc_gbp_billion: f64,

    #[serde(rename = "MC_EUR_Billion")]
    pub mc_eur_billion: f64,

    #[serde(rename = "MC_INR_Billion")]
    pub mc_inr_billion: f64,
}

impl BankRecord {
    /// Converted value for one target currency
    pub fn market_cap(&self, currency: TargetCurrency) -> f64 {
        match currency {
            TargetCurrency::Gbp => self.mc_gbp_billion,
            TargetCurrency::Eur => self.mc_eur_billion,
            TargetCurrency::Inr => self.mc_inr_billion,
        }
    }
}

/// Ordered rows of the run, in page order. Duplicate names are allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BankTable {
    records: Vec<BankRecord>,
}

impl BankTable {
    pub fn records(&self) -> &[BankRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BankRecord> {
        self.records.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name.as_str()).collect()
    }
}

impl From<Vec<BankRecord>> for BankTable {
    fn from(records: Vec<BankRecord>) -> Self {
        BankTable { records }
    }
}

impl FromIterator<BankRecord> for BankTable {
    fn from_iter<I: IntoIterator<Item = BankRecord>>(iter: I) -> Self {
        BankTable {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a BankTable {
    type Item = &'a BankRecord;
    type IntoIter = std::slice::Iter<'a, BankRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, usd: f64) -> BankRecord {
        BankRecord {
            name: name.to_string(),
            mc_usd_billion: usd,
            mc_gbp_billion: 0.0,
            mc_eur_billion: 0.0,
            mc_inr_billion: 0.0,
        }
    }

    #[test]
    fn test_names_keep_load_order() {
        let table: BankTable = vec![
            record("Small Bank", 10.0),
            record("Huge Bank", 500.0),
            record("Mid Bank", 100.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.names(), vec!["Small Bank", "Huge Bank", "Mid Bank"]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_column_names_match_output_order() {
        let columns: Vec<&str> = std::iter::once("Name")
            .chain(std::iter::once("MC_USD_Billion"))
            .chain(TargetCurrency::ALL.iter().map(|c| c.column()))
            .collect();

        assert_eq!(columns, OUTPUT_COLUMNS);
    }
}
