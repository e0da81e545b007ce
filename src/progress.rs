//! Terminal progress bar for a fetch batch.

use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::domain::FetchOutcome;
use crate::fetcher::parallel::ProgressObserver;

/// Draws `k/n` on stderr as fetches complete.
///
/// Hidden when disabled or when stderr is not a terminal.
pub struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    pub fn new(total: usize, enabled: bool) -> Self {
        let bar = if enabled && std::io::stderr().is_terminal() {
            let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
            if let Ok(style) =
                ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} days [{elapsed_precise}]")
            {
                bar.set_style(style);
            }
            bar
        } else {
            ProgressBar::hidden()
        };

        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn on_complete(&self, completed: usize, _total: usize, _outcome: &FetchOutcome) {
        self.bar.set_position(completed as u64);
    }
}
