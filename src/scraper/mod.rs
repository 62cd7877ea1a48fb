pub mod classifier;
pub mod cleaner;
pub mod dom;
pub mod http_client;
pub mod sources;

use crate::config::ScraperConfig;
use crate::models::{Candidate, FreeEvidence, Listing, Verdict};
use crate::utils::truncate_for_log;
use anyhow::{Context, Result};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use self::classifier::detect_free_signal;
use self::cleaner::{escape_title, host_label};
use self::http_client::{HttpClient, PageFetcher};
use self::sources::{Extraction, Source, passes_rating};

/// Politeness pause before each catalog page, in milliseconds: [500, 1300).
const POLITE_DELAY_MS: std::ops::Range<u64> = 500..1300;

// ── Catalog scraper ───────────────────────────────────────────────────────────

/// Turns catalog search pages into free-course listings.
pub struct CatalogScraper {
    fetcher: Box<dyn PageFetcher>,
    page_timeout: Duration,
    detail_timeout: Duration,
}

impl CatalogScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = HttpClient::new(config).context("Failed to build scraper")?;
        Ok(Self::with_fetcher(Box::new(client), config))
    }

    pub fn with_fetcher(fetcher: Box<dyn PageFetcher>, config: &ScraperConfig) -> Self {
        Self {
            fetcher,
            page_timeout: config.page_timeout(),
            detail_timeout: config.detail_timeout(),
        }
    }

    /// Scrape every URL in order, one at a time, deduplicating by link.
    ///
    /// A failing URL is logged and contributes nothing; it never aborts the batch.
    pub async fn scrape_all(&self, urls: &[String]) -> Vec<Listing> {
        let mut all = Vec::new();

        for url in urls {
            polite_delay().await;

            match self.dispatch(url).await {
                Ok(found) => {
                    info!("{}: {} listings", truncate_for_log(url, 80), found.len());
                    all.extend(found);
                }
                Err(e) => warn!("Skipping {}: {:#}", truncate_for_log(url, 80), e),
            }
        }

        let deduped = dedup_by_link(all);
        info!("Batch done: {} unique listings from {} pages", deduped.len(), urls.len());
        deduped
    }

    /// Fetch one catalog page and run the extractor its host calls for.
    ///
    /// An unreachable page yields an empty list; only an unusable URL is an error.
    pub async fn dispatch(&self, url: &str) -> Result<Vec<Listing>> {
        let parsed = Url::parse(url).with_context(|| format!("Invalid target URL {}", url))?;
        let host = host_label(&parsed);
        if host.is_empty() {
            anyhow::bail!("Target URL {} has no host", url);
        }

        let mut base = parsed.clone();
        base.set_path("/");
        base.set_query(None);
        base.set_fragment(None);

        let html = match self.fetcher.fetch(url, self.page_timeout).await {
            Ok(html) => html,
            Err(e) => {
                debug!("{}: page unavailable ({})", url, e);
                return Ok(Vec::new());
            }
        };

        let source = Source::for_host(&host);
        debug!("{}: routing to {} extractor", url, source.label());

        match source.extract_page(&html, &base, &host) {
            Extraction::Listings(listings) => Ok(listings),
            Extraction::Candidates(candidates) => Ok(self.filter_candidates(source, candidates).await),
        }
    }

    /// Rating gate, then local evidence, then escalation for the rest.
    async fn filter_candidates(&self, source: Source, candidates: Vec<Candidate>) -> Vec<Listing> {
        let mut escalated: HashMap<String, bool> = HashMap::new();
        let mut out = Vec::new();

        for c in candidates {
            if !passes_rating(c.rating) {
                debug!("{}: rating {:?} below threshold", c.link, c.rating);
                continue;
            }

            let free = if c.local.is_conclusive() {
                log_verdict(&c.link, &Verdict::Free(FreeEvidence::Local(c.local)))
            } else if let Some(&free) = escalated.get(&c.link) {
                free
            } else {
                let free = log_verdict(&c.link, &self.escalate(&c.link).await);
                escalated.insert(c.link.clone(), free);
                free
            };

            if free {
                out.push(Listing {
                    platform: source.label().to_string(),
                    title: escape_title(&c.title),
                    link: c.link,
                });
            }
        }

        out
    }

    /// Fetch the listing's own page and classify it as a whole.
    async fn escalate(&self, link: &str) -> Verdict {
        match self.fetcher.fetch(link, self.detail_timeout).await {
            Ok(body) => match detect_free_signal(&body) {
                Some(signal) => Verdict::Free(FreeEvidence::DetailPage(signal)),
                None => Verdict::NoEvidence,
            },
            Err(e) => Verdict::EscalationFailed(e),
        }
    }
}

fn log_verdict(link: &str, verdict: &Verdict) -> bool {
    match verdict {
        Verdict::Free(evidence) => debug!("{}: free ({:?})", link, evidence),
        Verdict::NoEvidence => debug!("{}: no free signal on detail page", link),
        Verdict::EscalationFailed(e) => debug!("{}: detail page unavailable ({})", link, e),
    }
    verdict.is_free()
}

async fn polite_delay() {
    let ms = rand::rng().random_range(POLITE_DELAY_MS);
    sleep(Duration::from_millis(ms)).await;
}

/// Keep the first listing for each link, preserving order.
pub fn dedup_by_link(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen = HashSet::new();
    listings
        .into_iter()
        .filter(|l| seen.insert(l.link.clone()))
        .collect()
}
