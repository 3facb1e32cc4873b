// Currency Transformer
// Adds the GBP / EUR / INR columns to the scraped rows

use crate::model::{BankRecord, BankTable, ScrapedBank, TargetCurrency};
use crate::rates::RateTable;

/// Round to 2 decimal places, ties to even
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Convert a USD figure with the table's rate for `currency`
pub fn convert(usd: f64, rates: &RateTable, currency: TargetCurrency) -> f64 {
    round2(usd * rates.rate(currency))
}

/// Consume the scraped rows and produce the final table, row order unchanged
pub fn transform(rows: Vec<ScrapedBank>, rates: &RateTable) -> BankTable {
    rows.into_iter()
        .map(|bank| BankRecord {
            mc_gbp_billion: convert(bank.mc_usd_billion, rates, TargetCurrency::Gbp),
            mc_eur_billion: convert(bank.mc_usd_billion, rates, TargetCurrency::Eur),
            mc_inr_billion: convert(bank.mc_usd_billion, rates, TargetCurrency::Inr),
            mc_usd_billion: bank.mc_usd_billion,
            name: bank.name,
        })
        .collect()
}
