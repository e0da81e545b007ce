use std::sync::Arc;

use crate::aggregator::Aggregator;
use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpTransport;
use crate::fetcher::parallel::ParallelFetcher;
use crate::fetcher::Transport;

pub struct AppContext {
    pub config: Config,
    pub parallel_fetcher: ParallelFetcher,
    pub aggregator: Aggregator,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let transport: Arc<dyn Transport + Send + Sync> = Arc::new(HttpTransport::new(&config.api)?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: Config, transport: Arc<dyn Transport + Send + Sync>) -> Self {
        let parallel_fetcher =
            ParallelFetcher::with_workers(transport, config.fetch.max_concurrency)
                .with_batch_timeout(config.fetch.batch_timeout());
        let aggregator = Aggregator::new(config.output.currencies.clone());

        Self {
            config,
            parallel_fetcher,
            aggregator,
        }
    }
}
