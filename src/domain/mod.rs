pub mod outcome;
pub mod rates;
pub mod target;

pub use outcome::{FetchFailure, FetchOutcome};
pub use rates::{DayRates, Quote, RateEntry, RateSnapshot, RateSummary};
pub use target::{DayCount, FetchTarget, DATE_FORMAT, MAX_DAYS};
