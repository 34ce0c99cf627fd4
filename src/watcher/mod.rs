//! Watch loop for feedwatch.
//!
//! Orchestrates a run: reconcile the registry against the watchlist, report
//! registry changes, then check every desired source for newly published
//! items and notify each one.

pub mod freshness;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::db::Database;
use crate::fetcher::{FeedFetcher, FetchedItem};
use crate::notifier::Notifier;
use crate::registry::{FeedSource, FeedSourceRepository, ReconcileOutcome};
use crate::watchlist;
use crate::Result;

/// Default run interval in seconds (6 hours).
pub const DEFAULT_RUN_INTERVAL_SECS: u64 = 21600;

/// Periodic feed watcher.
///
/// Runs once at startup, then at a fixed interval. Ticks are consumed on the
/// calling task, so runs never overlap; a tick that fires while a run is
/// still in progress is skipped.
pub struct Watcher<F, N> {
    db: Arc<Database>,
    fetcher: F,
    notifier: N,
    watchlist_path: PathBuf,
    run_interval: Duration,
}

impl<F: FeedFetcher, N: Notifier> Watcher<F, N> {
    /// Create a new watcher with the default run interval.
    pub fn new(
        db: Arc<Database>,
        fetcher: F,
        notifier: N,
        watchlist_path: impl Into<PathBuf>,
    ) -> Self {
        Self::with_interval(db, fetcher, notifier, watchlist_path, DEFAULT_RUN_INTERVAL_SECS)
    }

    /// Create a new watcher with a custom run interval.
    pub fn with_interval(
        db: Arc<Database>,
        fetcher: F,
        notifier: N,
        watchlist_path: impl Into<PathBuf>,
        interval_secs: u64,
    ) -> Self {
        Self {
            db,
            fetcher,
            notifier,
            watchlist_path: watchlist_path.into(),
            run_interval: Duration::from_secs(interval_secs),
        }
    }

    /// Run the watch loop.
    ///
    /// The startup run's failure is returned so broken configuration stops
    /// the process before any periodic work. After that the loop runs until
    /// the process is terminated; per-run failures are logged and the next
    /// tick proceeds as scheduled.
    pub async fn run(&self) -> Result<()> {
        info!(
            "Watcher started (run interval: {} seconds)",
            self.run_interval.as_secs()
        );

        self.run_once().await?;

        let mut timer = interval(self.run_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick resolves immediately; the startup run above already
        // covered it.
        timer.tick().await;

        loop {
            timer.tick().await;
            if let Err(e) = self.run_once().await {
                error!("Run failed: {}", e);
            }
        }
    }

    /// Execute a single reconcile-and-check run.
    ///
    /// Errors reading the watchlist or reconciling the registry abort the
    /// run; everything after that point is per-source and never stops the
    /// loop.
    pub async fn run_once(&self) -> Result<()> {
        let desired = watchlist::dedup_urls(watchlist::load(&self.watchlist_path)?);
        debug!("Watchlist lists {} feed(s)", desired.len());

        let repo = FeedSourceRepository::new(self.db.pool());
        let outcome = repo.reconcile(&desired, Utc::now()).await?;
        self.report_outcome(&outcome).await;

        for url in &desired {
            self.check_source(&repo, url).await;
        }

        Ok(())
    }

    /// Send summary notifications for registry changes.
    ///
    /// Reactivations are logged but not notified; a reactivated source
    /// announces itself through the backlog its next check picks up.
    async fn report_outcome(&self, outcome: &ReconcileOutcome) {
        if !outcome.added.is_empty() {
            info!("{} feed(s) added to the registry", outcome.added.len());
            let message = format_summary("added", &outcome.added);
            if let Err(e) = self.notifier.send(&message).await {
                warn!("Failed to send added-feeds summary: {}", e);
            }
        }

        if !outcome.reactivated.is_empty() {
            for source in &outcome.reactivated {
                info!("Feed reactivated: {}", source.url);
            }
        }

        if !outcome.deactivated.is_empty() {
            info!("{} feed(s) deactivated", outcome.deactivated.len());
            let message = format_summary("deactivated", &outcome.deactivated);
            if let Err(e) = self.notifier.send(&message).await {
                warn!("Failed to send deactivated-feeds summary: {}", e);
            }
        }
    }

    /// Check one source for newly published items.
    async fn check_source(&self, repo: &FeedSourceRepository<'_>, url: &str) {
        debug!("Checking feed: {}", url);

        let items = match self.fetcher.fetch(url).await {
            Ok(items) => items,
            Err(e) => {
                // Checkpoint untouched: the source is re-evaluated from the
                // same point on the next run.
                warn!("Failed to fetch feed {}: {}", url, e);
                return;
            }
        };

        let source = match repo.get_active_by_url(url).await {
            Ok(Some(source)) => source,
            Ok(None) => {
                warn!("Feed {} is not active in the registry, skipping", url);
                return;
            }
            Err(e) => {
                error!("Failed to load feed {} from the registry: {}", url, e);
                return;
            }
        };

        let evaluated_at = Utc::now();
        let evaluation = freshness::evaluate(source.last_checked_at, evaluated_at, items);

        for item in &evaluation.undated {
            debug!(
                "Feed {} item \"{}\" has no publication time, skipping",
                url, item.title
            );
        }

        let mut sent = 0;
        for item in &evaluation.fresh {
            match self.notifier.send(&format_item(item)).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    warn!("Failed to notify item \"{}\" from {}: {}", item.title, url, e);
                }
            }
        }

        // The checkpoint advances even when sends failed: once an item's
        // publish time falls behind the checkpoint it is never retried.
        match repo.set_last_checked(url, evaluation.next_checkpoint).await {
            Ok(true) => {}
            Ok(false) => warn!("Feed {} vanished before its checkpoint could advance", url),
            Err(e) => error!("Failed to advance checkpoint for {}: {}", url, e),
        }

        if !evaluation.fresh.is_empty() {
            info!(
                "Feed {}: {} new item(s), {} notified",
                url,
                evaluation.fresh.len(),
                sent
            );
        } else {
            debug!("Feed {}: no new items", url);
        }
    }
}

/// Format a per-item notification.
fn format_item(item: &FetchedItem) -> String {
    match &item.link {
        Some(link) => format!("{}\n{}", item.title, link),
        None => item.title.clone(),
    }
}

/// Format a registry change summary listing one URL per line.
fn format_summary(verb: &str, sources: &[FeedSource]) -> String {
    let urls: Vec<&str> = sources.iter().map(|s| s.url.as_str()).collect();
    format!(
        "{} feed(s) were {}:\n{}",
        sources.len(),
        verb,
        urls.join("\n")
    )
}
