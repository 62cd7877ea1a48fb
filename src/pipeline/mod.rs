//! Watch cycle: scrape → diff against seen links → alert → record.
//!
//! ## Run modes
//!
//! `check_and_notify()` — one cycle. Every listing whose link is not yet in
//!   the seen-link store gets its own alert; when nothing is new a single
//!   "no new courses" alert is sent instead. New links are recorded after
//!   alerting, whether or not delivery succeeded.
//!
//! `run_forever()` — one cycle immediately, then one per interval until Ctrl-C.
//!   A Ctrl-C that arrives mid-cycle lets that cycle finish, then stops.

use crate::models::Listing;
use crate::notifier::{AlertSink, NO_NEW_COURSES, format_message};
use crate::scraper::CatalogScraper;
use crate::storage::SeenLinks;
use crate::utils::Timer;
use anyhow::Result;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

pub struct Watcher {
    scraper: CatalogScraper,
    store: SeenLinks,
    sink: Box<dyn AlertSink>,
    targets: Vec<String>,
}

impl Watcher {
    pub fn new(
        scraper: CatalogScraper,
        store: SeenLinks,
        sink: Box<dyn AlertSink>,
        targets: Vec<String>,
    ) -> Self {
        Self {
            scraper,
            store,
            sink,
            targets,
        }
    }

    pub fn seen(&self) -> &SeenLinks {
        &self.store
    }

    pub async fn check_and_notify(&self) -> CycleStats {
        let _t = Timer::start("Course check");
        info!("Checking {} catalog pages for new courses", self.targets.len());

        let scraped = self.scraper.scrape_all(&self.targets).await;
        let fresh: Vec<Listing> = scraped
            .iter()
            .filter(|l| !l.link.is_empty() && !self.store.has(&l.link))
            .cloned()
            .collect();

        let mut stats = CycleStats {
            scraped: scraped.len(),
            new: fresh.len(),
            ..Default::default()
        };

        if fresh.is_empty() {
            info!("No new courses.");
            self.deliver(NO_NEW_COURSES, &mut stats).await;
        } else {
            for listing in &fresh {
                info!("New course found: {} ({})", listing.link, listing.platform);
                self.deliver(&format_message(listing), &mut stats).await;
            }

            match self.store.add_many(fresh.iter().map(|l| l.link.clone())) {
                Ok(added) => stats.recorded = added.len(),
                Err(e) => error!("Failed to record seen links: {:#}", e),
            }
        }

        info!("=== Done: {} ===", stats);
        stats
    }

    async fn deliver(&self, message: &str, stats: &mut CycleStats) {
        match self.sink.send(message).await {
            Ok(()) => stats.alerts_sent += 1,
            Err(e) => {
                error!("Failed to send alert: {}", e);
                stats.alert_failures += 1;
            }
        }
    }

    /// Run a cycle now and then every `every`, until interrupted.
    pub async fn run_forever(&self, every: Duration) -> Result<()> {
        self.run_until(every, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Like `run_forever`, stopping once `shutdown` resolves. A cycle in
    /// progress is never cut short; the stop takes effect right after it.
    pub async fn run_until<F>(&self, every: Duration, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Scheduler started. Running every {:?}.", every);

        // One listener for the whole run, polled before the first cycle starts.
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutting down.");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    self.check_and_notify().await;
                }
            }
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub scraped: usize,
    pub new: usize,
    pub recorded: usize,
    pub alerts_sent: usize,
    pub alert_failures: usize,
}

impl fmt::Display for CycleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scraped | {} new | {} alerts sent | {} alert failures",
            self.scraped, self.new, self.alerts_sent, self.alert_failures
        )
    }
}
