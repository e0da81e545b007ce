use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::app::{FxError, Result};

/// Date format used both in request URLs and in API payloads.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Upper bound on how many past days a single run may request.
pub const MAX_DAYS: u32 = 10;

/// One unit of fetch work: the endpoint for a single calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    pub date: NaiveDate,
    pub url: String,
}

impl FetchTarget {
    pub fn new(date: NaiveDate, url: String) -> Self {
        Self { date, url }
    }

    /// The date as the API spells it, e.g. `01.12.2014`.
    pub fn date_label(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.date_label(), self.url)
    }
}

/// Number of days to look back, validated to `1..=MAX_DAYS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCount(u32);

impl DayCount {
    pub fn new(days: i64) -> Result<Self> {
        if days > i64::from(MAX_DAYS) {
            return Err(FxError::InvalidDays(format!(
                "Please provide a number of days equal or less than {}.",
                MAX_DAYS
            )));
        }
        if days <= 0 {
            return Err(FxError::InvalidDays(
                "Please provide a number of days greater than 0.".to_string(),
            ));
        }
        Ok(Self(days as u32))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl FromStr for DayCount {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self> {
        let days = s.trim().parse::<i64>().map_err(|_| {
            FxError::InvalidDays(
                "Invalid argument. Please provide a valid integer for the number of days."
                    .to_string(),
            )
        })?;
        Self::new(days)
    }
}
