pub mod anchor;
pub mod poller;

pub use anchor::AnchorTracker;
pub use poller::{CycleReport, PollCycle};

use std::future::Future;
use std::time::Duration;
use subwatch_core::{Config, ErrorExt, Notifier, PostSearch};
use tracing::{info, warn};

/// Drives `PollCycle` forever on a fixed interval. A failed cycle is logged
/// and the next one retries every term.
pub struct BackgroundService<S, N> {
    cycle: PollCycle<S, N>,
    polling_interval: Duration,
}

impl<S: PostSearch, N: Notifier> BackgroundService<S, N> {
    pub fn new(cycle: PollCycle<S, N>, polling_interval: Duration) -> Self {
        Self {
            cycle,
            polling_interval,
        }
    }

    pub fn from_config(searcher: S, notifier: N, config: &Config) -> Self {
        Self::new(
            PollCycle::from_config(searcher, notifier, config),
            config.polling_interval,
        )
    }

    pub fn cycle(&self) -> &PollCycle<S, N> {
        &self.cycle
    }

    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    /// Run one cycle and log its outcome. Errors never escape.
    pub async fn poll_once(&mut self) -> Option<CycleReport> {
        info!(
            "about to search for the following terms: [{}] in r/{}",
            self.cycle.terms().join(","),
            self.cycle.subreddit()
        );

        match self.cycle.run_cycle().await {
            Ok(report) => {
                info!(
                    terms = report.terms_searched,
                    found = report.posts_found,
                    sent = report.notifications_sent,
                    "Poll cycle complete"
                );
                Some(report)
            }
            Err(e) => {
                if e.is_retryable() {
                    e.log_warn();
                } else {
                    e.log_error();
                }
                warn!("Poll cycle aborted: {}", e.user_friendly_message());
                None
            }
        }
    }

    /// Poll, sleep, repeat. Only `shutdown` resolving ends the loop, and it
    /// is only observed while sleeping between cycles.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            self.poll_once().await;
            info!("will check again in {}!", format_interval(self.polling_interval));

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping poller");
                    return;
                }
                _ = tokio::time::sleep(self.polling_interval) => {}
            }
        }
    }
}

fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else {
        format!("{} s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(Duration::from_secs(300)), "5 min");
        assert_eq!(format_interval(Duration::from_secs(90)), "90 s");
        assert_eq!(format_interval(Duration::from_millis(10)), "0 s");
    }
}
