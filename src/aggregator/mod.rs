use chrono::NaiveDate;

use crate::app::{FxError, Result};
use crate::domain::{DayRates, Quote, RateSnapshot, RateSummary, DATE_FORMAT};

/// Reshapes raw daily snapshots into a date-keyed summary restricted to a
/// set of currencies.
#[derive(Debug, Clone)]
pub struct Aggregator {
    currencies: Vec<String>,
}

impl Aggregator {
    pub fn new(currencies: Vec<String>) -> Self {
        Self { currencies }
    }

    /// Malformed payloads are logged and skipped.
    pub fn aggregate<'a, I>(&self, payloads: I) -> RateSummary
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut summary = RateSummary::new();

        for payload in payloads {
            match self.parse_payload(payload) {
                Ok((date, rates)) => summary.insert(date, rates),
                Err(e) => tracing::warn!("Skipping payload: {}", e),
            }
        }

        summary
    }

    /// Parses one snapshot. A day with none of the wanted currencies still
    /// yields an (empty) entry.
    pub fn parse_payload(&self, payload: &str) -> Result<(NaiveDate, DayRates)> {
        let snapshot: RateSnapshot = serde_json::from_str(payload)?;
        let date = NaiveDate::parse_from_str(&snapshot.date, DATE_FORMAT)
            .map_err(|e| FxError::Payload(format!("bad date {:?}: {}", snapshot.date, e)))?;

        let mut rates = DayRates::new();
        for entry in snapshot.exchange_rate {
            let Some(currency) = entry.currency else {
                continue;
            };
            if !self.currencies.contains(&currency) {
                continue;
            }

            match (entry.sale_rate, entry.purchase_rate) {
                (Some(sale), Some(purchase)) => {
                    rates.insert(currency, Quote { sale, purchase });
                }
                _ => {
                    tracing::debug!("{} on {} has no commercial rate", currency, snapshot.date);
                }
            }
        }

        Ok((date, rates))
    }
}
