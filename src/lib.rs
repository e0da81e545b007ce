//! # fxsnap
//!
//! Fetches daily exchange-rate snapshots for the last few days and prints a
//! date-indexed summary of selected currencies.
//!
//! ## Architecture
//!
//! ```text
//! Planner → ParallelFetcher (limiter-gated) → Aggregator → Output
//! ```
//!
//! - [`planner`]: one request target per day, counting back from today
//! - [`fetcher`]: bounded-concurrency HTTP fetching with per-target outcomes
//! - [`aggregator`]: keeps the wanted currencies, keyed by date
//! - [`output`]: JSON or table rendering
//!
//! ## Quick Start
//!
//! ```bash
//! # Rates for the last 3 days
//! fxsnap 3
//!
//! # Pounds and dollars as a table, 4 requests at a time
//! fxsnap 5 -c GBP -c USD -f table -w 4
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the config,
/// transport, parallel fetcher and aggregator.
pub mod app;

/// Configuration loaded from `~/.config/fxsnap/config.toml`.
pub mod config;

/// Command-line interface using clap.
pub mod cli;

/// Core domain models.
///
/// - [`FetchTarget`](domain::FetchTarget): one dated request
/// - [`FetchOutcome`](domain::FetchOutcome): success with payload or failure with reason
/// - [`RateSummary`](domain::RateSummary): date-keyed retained quotes
pub mod domain;

/// HTTP fetching under a shared concurrency cap.
///
/// - [`Transport`](fetcher::Transport): async trait for a single GET
/// - [`HttpTransport`](fetcher::http_fetcher::HttpTransport): reqwest-based implementation
/// - [`ConcurrencyLimiter`](fetcher::ConcurrencyLimiter): semaphore-backed admission gate
/// - [`ParallelFetcher`](fetcher::parallel::ParallelFetcher): runs a batch to completion
pub mod fetcher;

/// Request target generation.
pub mod planner;

/// Snapshot parsing and currency filtering.
pub mod aggregator;

pub mod output;

pub mod progress;
