pub mod commands;

use std::path::PathBuf;

use clap::Parser;

use crate::config::{normalize_currencies, Config, OutputFormat};
use crate::domain::DayCount;

#[derive(Parser, Debug)]
#[command(name = "fxsnap")]
#[command(about = "Exchange rates for the last few days", long_about = None)]
#[command(allow_negative_numbers = true)]
pub struct Cli {
    /// Number of past days to fetch, today included (1-10)
    #[arg(value_parser = clap::value_parser!(DayCount))]
    pub days: Option<DayCount>,

    /// Number of parallel requests
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Currency code to keep; repeat for several (default: EUR, USD)
    #[arg(short, long = "currency")]
    pub currencies: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Archive endpoint prefix the date is appended to
    #[arg(long)]
    pub base_url: Option<String>,

    /// Overall deadline in seconds; unfinished days are dropped
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Config file to use instead of ~/.config/fxsnap/config.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(workers) = self.workers {
            config.fetch.max_concurrency = workers;
        }
        if !self.currencies.is_empty() {
            config.output.currencies = normalize_currencies(&self.currencies);
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.fetch.batch_timeout_secs = timeout;
        }
    }
}
