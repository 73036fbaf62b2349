//! Crawler coordinator - session orchestration
//!
//! This module wires the remote API, storage, validator, expander and batch
//! scheduler together and owns:
//! - Seeding the frontier (cold or warm start)
//! - The control surface (`crawl`, `seed`, `cancel`)
//! - Run bookkeeping in storage

use crate::config::Config;
use crate::crawler::expander::ParticipantExpander;
use crate::crawler::pipeline::MatchPipeline;
use crate::crawler::report::Reporter;
use crate::crawler::scheduler::{with_frontier, BatchScheduler, CrawlSummary};
use crate::crawler::validator::MatchValidator;
use crate::crawler::SharedFrontier;
use crate::notify::Notifier;
use crate::riot::RiotApi;
use crate::state::Frontier;
use crate::storage::{self, RunStatus, SharedStorage};
use crate::CrawlError;
use futures::future::join_all;
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// How the frontier was seeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedMode {
    /// No known participants; the configured seed match was queued
    Cold { match_id: String },

    /// Known participants were sampled for their match histories
    Warm { sampled: usize, queued: usize },
}

/// Cancels a crawl from another task
#[derive(Debug, Clone)]
pub struct CrawlHandle {
    cancelled: Arc<watch::Sender<bool>>,
    frontier: SharedFrontier,
    reporter: Reporter,
}

impl CrawlHandle {
    /// Stops the crawl at the next batch boundary
    ///
    /// Clears the queued frontier; the batch in flight still settles.
    /// Returns the number of queued ids dropped.
    pub fn cancel(&self) -> usize {
        self.cancelled.send_replace(true);

        let dropped = self
            .frontier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        self.reporter
            .shout(format!("Crawl cancelled; dropped {} queued matches", dropped));
        dropped
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }
}

/// Resets the running flag when a session ends
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Main crawler structure
pub struct Crawler {
    config_hash: String,
    seed_match_id: String,
    warm_start_sample: usize,
    storage: SharedStorage,
    frontier: SharedFrontier,
    expander: Arc<ParticipantExpander>,
    scheduler: BatchScheduler,
    reporter: Reporter,
    handle: CrawlHandle,
    running: AtomicBool,
}

impl Crawler {
    /// Creates a new crawler
    ///
    /// The finished set is seeded with every match id already stored.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `config_hash` - Hash recorded with each run
    /// * `api` - Remote data source
    /// * `storage` - Persistence backend
    /// * `notifier` - Progress feed
    pub fn new(
        config: &Config,
        config_hash: impl Into<String>,
        api: Arc<dyn RiotApi>,
        storage: SharedStorage,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, CrawlError> {
        let finished = storage::lock(&storage)?.list_match_ids()?;
        tracing::info!("Loaded {} finished matches from storage", finished.len());
        let frontier: SharedFrontier = Arc::new(Mutex::new(Frontier::with_finished(finished)));

        let reporter = Reporter::new(notifier);
        let band = config.filter.band();

        let expander = Arc::new(ParticipantExpander::new(
            api.clone(),
            storage.clone(),
            band.clone(),
            reporter.clone(),
        ));
        let validator = MatchValidator::new(
            expander.clone(),
            storage.clone(),
            band,
            config.filter.patches(),
        );
        let pipeline = MatchPipeline::new(api, storage.clone(), validator, reporter.clone());

        let (cancelled, cancelled_rx) = watch::channel(false);
        let scheduler = BatchScheduler::new(
            frontier.clone(),
            pipeline,
            expander.clone(),
            reporter.clone(),
            cancelled_rx,
            config.crawler.batch_size,
            config.crawler.cooldown(),
        );

        let handle = CrawlHandle {
            cancelled: Arc::new(cancelled),
            frontier: frontier.clone(),
            reporter: reporter.clone(),
        };

        Ok(Self {
            config_hash: config_hash.into(),
            seed_match_id: config.crawler.seed_match_id.clone(),
            warm_start_sample: config.crawler.warm_start_sample,
            storage,
            frontier,
            expander,
            scheduler,
            reporter,
            handle,
            running: AtomicBool::new(false),
        })
    }

    /// Returns a handle for cancelling from another task
    pub fn handle(&self) -> CrawlHandle {
        self.handle.clone()
    }

    /// Stops the crawl at the next batch boundary
    pub fn cancel(&self) -> usize {
        self.handle.cancel()
    }

    /// Seeds the frontier
    ///
    /// With no known participants the configured seed match is queued.
    /// Otherwise a random sample of known participants is expanded.
    pub async fn seed(&self) -> Result<SeedMode, CrawlError> {
        let mut participants = storage::lock(&self.storage)?.list_participant_ids()?;

        if participants.is_empty() {
            let match_id = self.seed_match_id.clone();
            with_frontier(&self.frontier, |f| f.enqueue([match_id.clone()]))?;
            self.reporter
                .shout(format!("Cold start from seed match {}", match_id));
            return Ok(SeedMode::Cold { match_id });
        }

        participants.shuffle(&mut rand::thread_rng());
        participants.truncate(self.warm_start_sample);

        self.reporter.shout(format!(
            "Warm start from {} known participants",
            participants.len()
        ));
        join_all(
            participants
                .iter()
                .map(|puuid| self.expander.discover_matches(puuid)),
        )
        .await;

        let discovered = self.expander.take_discovered();
        let queued = with_frontier(&self.frontier, |f| {
            if self.handle.is_cancelled() {
                0
            } else {
                f.enqueue(discovered)
            }
        })?;

        self.reporter
            .shout(format!("Seeded frontier with {} matches", queued));
        Ok(SeedMode::Warm {
            sampled: participants.len(),
            queued,
        })
    }

    /// Seeds and runs one crawl session
    ///
    /// # Returns
    ///
    /// * `Ok(Some(summary))` - The session ran to exhaustion or cancellation
    /// * `Ok(None)` - A session was already running
    /// * `Err(CrawlError)` - Storage or state failure
    pub async fn crawl(&self) -> Result<Option<CrawlSummary>, CrawlError> {
        if self.running.swap(true, Ordering::SeqCst) {
            self.reporter.warn("Crawl already running; ignoring request");
            return Ok(None);
        }
        let _running = RunningGuard(&self.running);
        self.handle.cancelled.send_replace(false);

        let run_id = storage::lock(&self.storage)?.create_run(&self.config_hash)?;
        tracing::info!("Starting crawl run {}", run_id);

        let result = self.seed_and_run().await;

        let (status, ingested) = match &result {
            Ok(summary) if summary.cancelled => (RunStatus::Cancelled, summary.ingested),
            Ok(summary) => (RunStatus::Completed, summary.ingested),
            Err(_) => (RunStatus::Failed, 0),
        };
        storage::lock(&self.storage)?.finish_run(run_id, status, ingested as u64)?;
        tracing::info!("Run {} finished as {}", run_id, status.to_db_string());

        result.map(Some)
    }

    async fn seed_and_run(&self) -> Result<CrawlSummary, CrawlError> {
        self.seed().await?;
        self.scheduler.run().await
    }

    /// Queued match ids, front first
    pub fn frontier_snapshot(&self) -> Result<Vec<String>, CrawlError> {
        with_frontier(&self.frontier, |f| f.snapshot())
    }

    pub fn finished_count(&self) -> Result<usize, CrawlError> {
        with_frontier(&self.frontier, |f| f.finished_len())
    }

    pub(crate) fn scheduler(&self) -> &BatchScheduler {
        &self.scheduler
    }

    #[cfg(test)]
    pub(crate) fn frontier(&self) -> &SharedFrontier {
        &self.frontier
    }
}
