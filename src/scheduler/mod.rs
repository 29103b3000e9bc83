//! Periodic feed polling.
//!
//! Each tick runs one cycle: claim the least recently fetched feed, fetch it,
//! report its items. Cycles run inline on the scheduling task, so they never
//! overlap, and a stop request is honoured between cycles only.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::app::{GatorError, Result};
use crate::domain::{Feed, FeedDocument};
use crate::fetcher::Fetcher;
use crate::store::Store;

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time between the start of two cycles
    pub interval: Duration,
    /// Upper bound on one fetch; the interval caps it further
    pub fetch_timeout: Duration,
}

impl SchedulerConfig {
    pub fn new(interval: Duration, fetch_timeout: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(GatorError::Validation(
                "polling interval must be greater than zero".into(),
            ));
        }
        if fetch_timeout.is_zero() {
            return Err(GatorError::Validation(
                "fetch timeout must be greater than zero".into(),
            ));
        }
        Ok(Self {
            interval,
            fetch_timeout,
        })
    }

    /// Deadline handed to the fetcher.
    pub fn fetch_deadline(&self) -> Duration {
        self.interval.min(self.fetch_timeout)
    }

    /// Parse interval strings like "30s", "1m", "1h30m", "500ms", "1d",
    /// or a bare number of seconds.
    pub fn parse_interval(s: &str) -> Result<Duration> {
        let s = s.trim();

        let duration = if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| GatorError::Validation(format!("Invalid seconds: {}", s)))?
        } else {
            humantime::parse_duration(s).map_err(|e| {
                GatorError::Validation(format!(
                    "Invalid interval '{}': {}. Use format like '30s', '1m', '1h'",
                    s, e
                ))
            })?
        };

        if duration.is_zero() {
            return Err(GatorError::Validation(
                "polling interval must be greater than zero".into(),
            ));
        }
        Ok(duration)
    }

    /// Format interval for display
    pub fn format_interval(interval: Duration) -> String {
        let secs = interval.as_secs();
        if interval.subsec_nanos() != 0 || secs == 0 {
            format!("{}ms", interval.as_millis())
        } else if secs >= 86400 && secs.is_multiple_of(86400) {
            format!("{}d", secs / 86400)
        } else if secs >= 3600 && secs.is_multiple_of(3600) {
            format!("{}h", secs / 3600)
        } else if secs >= 60 && secs.is_multiple_of(60) {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }
}

/// Result of one successful claim → fetch cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub feed: Feed,
    pub document: FeedDocument,
}

impl CycleReport {
    pub fn item_count(&self) -> usize {
        self.document.items.len()
    }

    /// Item titles in document order.
    pub fn titles(&self) -> Vec<&str> {
        self.document.titles().collect()
    }
}

pub struct Scheduler<S> {
    store: Arc<S>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    config: SchedulerConfig,
    shutdown: CancellationToken,
}

impl<S: Store + Send + Sync> Scheduler<S> {
    pub fn new(
        store: Arc<S>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Token that stops the loop when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Ask the loop to stop. A cycle already in flight finishes first.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Run until stopped, logging each cycle.
    pub async fn run(&self) {
        self.run_with(|_| {}).await
    }

    /// Run until stopped, handing every successful cycle to `on_report`.
    ///
    /// The first cycle starts immediately. Per-cycle failures are logged and
    /// never end the loop.
    pub async fn run_with<F>(&self, mut on_report: F)
    where
        F: FnMut(&CycleReport),
    {
        tracing::info!(
            "Collecting feeds every {}",
            SchedulerConfig::format_interval(self.config.interval)
        );

        let mut timer = interval(self.config.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            match self.run_cycle().await {
                Ok(report) => on_report(&report),
                Err(GatorError::NoFeedsAvailable) => {
                    tracing::info!("No feeds available to fetch, waiting for next tick");
                }
                // Already logged with the feed it belongs to.
                Err(e) if e.is_fetch_failure() => {}
                Err(e) => tracing::error!("Fetch cycle failed: {}", e),
            }
        }

        tracing::info!("Scheduler stopped");
    }

    /// Run a single claim → fetch → report cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let feed = self.store.claim_next_feed(Utc::now())?;
        tracing::info!("Fetching feed: {} ({})", feed.display_name(), feed.url);

        let document = self
            .fetcher
            .fetch(&feed.url, self.config.fetch_deadline())
            .await
            .inspect_err(|e| tracing::warn!("Error fetching feed {}: {}", feed.url, e))?;

        let report = CycleReport { feed, document };
        tracing::info!(
            "Found {} items in feed: {}",
            report.item_count(),
            report.feed.display_name()
        );
        for title in report.titles() {
            tracing::debug!("- {}", title);
        }

        Ok(report)
    }
}

/// Cancel `token` on SIGINT or SIGTERM (Ctrl+C on Windows).
pub fn cancel_on_signal(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        tokio::spawn(async move {
            let (mut sigterm, mut sigint) =
                match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                    (Ok(term), Ok(int)) => (term, int),
                    (Err(e), _) | (_, Err(e)) => {
                        tracing::error!("Failed to install signal handlers: {}", e);
                        return;
                    }
                };

            tokio::select! {
                _ = sigterm.recv() => {},
                _ = sigint.recv() => {},
            }
            tracing::info!("Shutdown requested, finishing current cycle");
            token.cancel();
        });
    }

    #[cfg(windows)]
    {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested, finishing current cycle");
                token.cancel();
            }
        });
    }
}
