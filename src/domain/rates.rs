use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::DATE_FORMAT;

/// Raw archive record for a single day, as returned by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSnapshot {
    pub date: String,
    pub exchange_rate: Vec<RateEntry>,
}

/// One currency row inside a [`RateSnapshot`].
///
/// Commercial rates are only published for a handful of currencies, so
/// everything but the code is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateEntry {
    pub currency: Option<String>,
    pub sale_rate: Option<f64>,
    pub purchase_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quote {
    pub sale: f64,
    pub purchase: f64,
}

/// Retained quotes for one day, keyed by currency code.
pub type DayRates = BTreeMap<String, Quote>;

/// Date-keyed summary of all fetched days.
///
/// Serializes as a map from `dd.mm.YYYY` to [`DayRates`], newest day first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateSummary {
    days: BTreeMap<NaiveDate, DayRates>,
}

impl RateSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later inserts for the same date replace earlier ones.
    pub fn insert(&mut self, date: NaiveDate, rates: DayRates) {
        self.days.insert(date, rates);
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DayRates> {
        self.days.get(&date)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Days from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &DayRates)> {
        self.days.iter().rev()
    }
}

impl Serialize for RateSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.iter()
                .map(|(date, rates)| (date.format(DATE_FORMAT).to_string(), rates)),
        )
    }
}
