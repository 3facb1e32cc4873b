// Exchange rate side file
// Currency,Rate
// GBP,0.8
// ...

use crate::error::EtlError;
use crate::model::TargetCurrency;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(rename = "Currency")]
    currency: String,

    #[serde(rename = "Rate")]
    rate: f64,
}

/// Multipliers against USD, loaded once per run
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    pub fn load(path: &Path) -> Result<Self, EtlError> {
        let file = std::fs::File::open(path).map_err(|e| {
            EtlError::config_with(format!("cannot open rate file {}", path.display()), e)
        })?;
        Self::from_reader(file)
    }

    /// Parse `Currency,Rate` rows. Codes are normalised to upper case; extra
    /// currencies are kept, duplicates and non-positive rates are rejected.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, EtlError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rates = HashMap::new();

        for (line_num, result) in rdr.deserialize::<RateRow>().enumerate() {
            let row = result.map_err(|e| {
                EtlError::config_with(format!("malformed rate row at line {}", line_num + 2), e)
            })?;

            let code = row.currency.to_uppercase();
            if code.is_empty() {
                return Err(EtlError::config(format!("empty currency code at line {}", line_num + 2)));
            }
            if !row.rate.is_finite() || row.rate <= 0.0 {
                return Err(EtlError::config(format!(
                    "rate for {code} must be a positive number, got {}",
                    row.rate
                )));
            }
            if rates.insert(code.clone(), row.rate).is_some() {
                return Err(EtlError::config(format!("duplicate rate for {code}")));
            }
        }

        for currency in TargetCurrency::ALL {
            if !rates.contains_key(currency.code()) {
                return Err(EtlError::config(format!(
                    "rate file has no {} row",
                    currency.code()
                )));
            }
        }

        Ok(RateTable { rates })
    }

    /// Rate for a conversion target; presence is checked at load time
    pub fn rate(&self, currency: TargetCurrency) -> f64 {
        self.rates.get(currency.code()).copied().unwrap_or(f64::NAN)
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(&code.to_uppercase()).copied()
    }
}
