pub mod http_fetcher;
pub mod limiter;
pub mod parallel;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{FetchFailure, FetchOutcome, FetchTarget};

pub use limiter::{ConcurrencyLimiter, LimiterPermit};

/// Status line and body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait Transport {
    async fn get(&self, url: &str) -> Result<TransportResponse>;
}

/// Performs a single GET for `target` while holding a limiter slot.
///
/// The slot covers the network exchange only and is released before the
/// outcome is built. Failures are returned, never raised.
pub async fn fetch_one(
    transport: &(dyn Transport + Send + Sync),
    limiter: &ConcurrencyLimiter,
    target: FetchTarget,
) -> FetchOutcome {
    let response = {
        let _permit = limiter.acquire().await;
        tracing::debug!("Requesting {}", target.url);
        transport.get(&target.url).await
    };

    match response {
        Ok(response) if response.status == 200 => FetchOutcome::Success {
            target,
            body: response.body,
        },
        Ok(response) => FetchOutcome::Failure {
            target,
            reason: FetchFailure::Status(response.status),
        },
        Err(e) => FetchOutcome::Failure {
            target,
            reason: FetchFailure::Transport(e.to_string()),
        },
    }
}
