use chrono::NaiveDate;

use crate::app::{AppContext, Result};
use crate::domain::{DayCount, RateSummary};
use crate::fetcher::parallel::{BatchReport, ProgressObserver};
use crate::output;
use crate::planner::plan_targets;
use crate::progress::ProgressBarObserver;

/// What a snapshot run produced.
#[derive(Debug)]
pub struct SnapshotRun {
    pub summary: RateSummary,
    pub report: BatchReport,
}

/// Plans, fetches and aggregates the last `days` days ending at `today`.
pub async fn run_snapshot(
    ctx: &AppContext,
    days: DayCount,
    today: NaiveDate,
    observer: &dyn ProgressObserver,
) -> Result<SnapshotRun> {
    let targets = plan_targets(&ctx.config.api.base_url, days, today)?;
    tracing::debug!(
        "Fetching {} days with {} workers",
        targets.len(),
        ctx.parallel_fetcher.workers()
    );

    let report = ctx
        .parallel_fetcher
        .fetch_all_observed(targets, observer)
        .await;
    let summary = ctx.aggregator.aggregate(report.payloads());

    Ok(SnapshotRun { summary, report })
}

/// Runs a snapshot with a progress bar and prints the rendered summary.
pub async fn snapshot(
    ctx: &AppContext,
    days: DayCount,
    today: NaiveDate,
    show_progress: bool,
) -> Result<()> {
    let progress = ProgressBarObserver::new(days.get() as usize, show_progress);
    let run = run_snapshot(ctx, days, today, &progress).await?;
    progress.finish();

    println!("{}", output::render(&run.summary, ctx.config.output.format)?);

    let failed = run.report.failure_count();
    if failed > 0 {
        eprintln!(
            "Fetched {} of {} days ({} failed)",
            run.report.success_count(),
            run.report.outcomes.len(),
            failed
        );
    }

    Ok(())
}
