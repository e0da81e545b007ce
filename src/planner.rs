use chrono::{Days, NaiveDate};
use url::Url;

use crate::app::Result;
use crate::domain::{DayCount, FetchTarget, DATE_FORMAT};

/// Builds one target per day, starting at `today` and walking backwards.
pub fn plan_targets(base_url: &str, days: DayCount, today: NaiveDate) -> Result<Vec<FetchTarget>> {
    Url::parse(base_url)?;

    let targets = (0..u64::from(days.get()))
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|date| {
            let url = format!("{}{}", base_url, date.format(DATE_FORMAT));
            FetchTarget::new(date, url)
        })
        .collect();

    Ok(targets)
}
