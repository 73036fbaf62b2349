//! Batch scheduler for the crawl loop
//!
//! This module handles:
//! - Taking fixed-size batches from the frontier
//! - Running every match of a batch concurrently and waiting for all of them
//! - Folding discoveries and settled ids back into the frontier at the barrier
//! - Retrying rate-limited batches after a cooldown
//! - Stopping on cancellation or an empty frontier

use crate::crawler::expander::ParticipantExpander;
use crate::crawler::pipeline::{MatchPipeline, Settlement};
use crate::crawler::report::Reporter;
use crate::crawler::SharedFrontier;
use crate::state::Frontier;
use crate::{CrawlError, MatchError};
use futures::future::join_all;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// Where the crawl loop is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No batch running; the loop exits
    Idle,

    /// A batch is ready to be taken (or retaken after a rate limit)
    BatchRunning,

    /// Waiting out the cooldown before the next attempt
    Cooldown,
}

/// Per-batch settlement counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTally {
    pub ingested: usize,
    pub rejected: usize,
    pub missing: usize,
}

/// Result of one scheduler step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The frontier had nothing to take
    Empty,

    /// Every match settled; the batch is finished
    Complete(BatchTally),

    /// At least one match was rate limited; the next step retries exactly this batch
    RateLimited { size: usize },

    /// An unexpected failure; the whole batch was finished anyway
    Failed { tally: BatchTally, cause: String },
}

impl BatchOutcome {
    /// Classifies a batch from its per-match results
    ///
    /// A rate limit anywhere in the batch wins over unexpected failures.
    pub fn classify(results: &[Result<Settlement, MatchError>]) -> Self {
        let mut tally = BatchTally::default();
        let mut cause = None;

        for result in results {
            match result {
                Ok(Settlement::Ingested) => tally.ingested += 1,
                Ok(Settlement::Rejected(_)) => tally.rejected += 1,
                Ok(Settlement::Missing) => tally.missing += 1,
                Err(MatchError::RateLimited) => {
                    return Self::RateLimited {
                        size: results.len(),
                    }
                }
                Err(e) => {
                    cause.get_or_insert_with(|| e.to_string());
                }
            }
        }

        match cause {
            Some(cause) => Self::Failed { tally, cause },
            None => Self::Complete(tally),
        }
    }

    /// State the loop moves to after this outcome
    pub fn next_state(&self, frontier_empty: bool) -> SchedulerState {
        match self {
            Self::Empty => SchedulerState::Idle,
            Self::Complete(_) if frontier_empty => SchedulerState::Idle,
            Self::Complete(_) => SchedulerState::BatchRunning,
            Self::RateLimited { .. } | Self::Failed { .. } => SchedulerState::Cooldown,
        }
    }
}

/// Totals for one crawl session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub batches: usize,
    pub ingested: usize,
    pub rejected: usize,
    pub missing: usize,
    pub rate_limit_retries: usize,
    pub failed_batches: usize,
    pub cancelled: bool,
}

impl CrawlSummary {
    fn record(&mut self, outcome: &BatchOutcome) {
        let tally = match outcome {
            BatchOutcome::Empty => return,
            BatchOutcome::Complete(tally) => tally,
            BatchOutcome::RateLimited { .. } => {
                self.rate_limit_retries += 1;
                return;
            }
            BatchOutcome::Failed { tally, .. } => {
                self.failed_batches += 1;
                tally
            }
        };

        self.batches += 1;
        self.ingested += tally.ingested;
        self.rejected += tally.rejected;
        self.missing += tally.missing;
    }
}

/// Locks the frontier for a short fold
pub(crate) fn with_frontier<T>(
    frontier: &SharedFrontier,
    f: impl FnOnce(&mut Frontier) -> T,
) -> Result<T, CrawlError> {
    let mut guard = frontier
        .lock()
        .map_err(|_| CrawlError::StatePoisoned("frontier"))?;
    Ok(f(&mut guard))
}

/// Drives batches through the pipeline until the frontier drains or the crawl is cancelled
pub struct BatchScheduler {
    frontier: SharedFrontier,
    pipeline: MatchPipeline,
    expander: Arc<ParticipantExpander>,
    reporter: Reporter,
    cancelled: watch::Receiver<bool>,
    batch_size: usize,
    cooldown: Duration,
    /// Ids of a rate-limited batch awaiting retry
    retry: Mutex<Option<Vec<String>>>,
}

impl BatchScheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `frontier` - The shared frontier
    /// * `pipeline` - Per-match processing
    /// * `expander` - Source of discovered match ids, drained at each barrier
    /// * `reporter` - Progress sink
    /// * `cancelled` - Cancellation flag
    /// * `batch_size` - Matches per batch
    /// * `cooldown` - Delay after a rate limit or failed batch
    pub fn new(
        frontier: SharedFrontier,
        pipeline: MatchPipeline,
        expander: Arc<ParticipantExpander>,
        reporter: Reporter,
        cancelled: watch::Receiver<bool>,
        batch_size: usize,
        cooldown: Duration,
    ) -> Self {
        Self {
            frontier,
            pipeline,
            expander,
            reporter,
            cancelled,
            batch_size,
            cooldown,
            retry: Mutex::new(None),
        }
    }

    pub fn pipeline(&self) -> &MatchPipeline {
        &self.pipeline
    }

    fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Runs batches until the frontier drains or the crawl is cancelled
    pub async fn run(&self) -> Result<CrawlSummary, CrawlError> {
        let mut summary = CrawlSummary::default();
        let mut state = SchedulerState::BatchRunning;

        loop {
            if self.is_cancelled() {
                summary.cancelled = true;
                self.reporter.shout("Crawl stopped after cancellation");
                break;
            }

            state = match state {
                SchedulerState::Idle => break,
                SchedulerState::BatchRunning => {
                    let outcome = self.step().await?;
                    summary.record(&outcome);
                    let frontier_empty = with_frontier(&self.frontier, |f| f.is_empty())?;
                    outcome.next_state(frontier_empty)
                }
                SchedulerState::Cooldown => {
                    self.cool_down().await;
                    SchedulerState::BatchRunning
                }
            };
        }

        if !summary.cancelled {
            self.reporter.shout(format!(
                "Frontier exhausted after {} batches: {} ingested, {} rejected, {} not found",
                summary.batches, summary.ingested, summary.rejected, summary.missing
            ));
        }

        Ok(summary)
    }

    fn retry_slot(&self) -> std::sync::MutexGuard<'_, Option<Vec<String>>> {
        self.retry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Processes one batch and folds the results into the frontier
    ///
    /// After a rate limit the next call retries the same ids, ignoring
    /// anything queued since. Retried ids dropped by a cancel are skipped.
    pub async fn step(&self) -> Result<BatchOutcome, CrawlError> {
        let retry = self.retry_slot().take();
        let batch = with_frontier(&self.frontier, |f| {
            let retried = retry.map(|ids| f.take_ids(&ids)).unwrap_or_default();
            if retried.is_empty() {
                f.take_batch(self.batch_size)
            } else {
                retried
            }
        })?;
        if batch.is_empty() {
            return Ok(BatchOutcome::Empty);
        }

        self.reporter
            .shout(format!("Starting batch of {} matches", batch.len()));

        let results = join_all(batch.iter().map(|id| self.pipeline.process(id))).await;
        let outcome = BatchOutcome::classify(&results);
        let discovered = self.expander.take_discovered();

        // The flag is read under the frontier lock; `cancel` sets it before clearing
        let (cancelled, added, queued, finished) = with_frontier(&self.frontier, |f| {
            let cancelled = self.is_cancelled();
            match &outcome {
                BatchOutcome::RateLimited { .. } if cancelled => f.release(&batch),
                BatchOutcome::RateLimited { .. } => f.requeue_front(batch.clone()),
                _ => f.mark_finished(batch.iter().cloned()),
            }
            let added = if cancelled { 0 } else { f.enqueue(discovered) };
            (cancelled, added, f.len(), f.finished_len())
        })?;

        if matches!(outcome, BatchOutcome::RateLimited { .. }) && !cancelled {
            *self.retry_slot() = Some(batch.clone());
        }

        match &outcome {
            BatchOutcome::Empty => {}
            BatchOutcome::Complete(tally) => self.reporter.shout(format!(
                "Batch complete: {} ingested, {} rejected, {} not found; {} new, {} queued, {} finished",
                tally.ingested, tally.rejected, tally.missing, added, queued, finished
            )),
            BatchOutcome::RateLimited { size } => self.reporter.warn(format!(
                "Rate limited; retrying batch of {} after {:?}",
                size, self.cooldown
            )),
            BatchOutcome::Failed { cause, .. } => self.reporter.error(format!(
                "Batch failed ({}); skipping {} matches after {:?}",
                cause,
                batch.len(),
                self.cooldown
            )),
        }

        Ok(outcome)
    }

    /// Sleeps for the cooldown, returning early on cancellation
    async fn cool_down(&self) {
        let mut cancelled = self.cancelled.clone();
        tokio::select! {
            _ = tokio::time::sleep(self.cooldown) => {}
            _ = cancelled.wait_for(|c| *c) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::testing::{
        harness, harness_from, harness_with, ranked_match, test_config, FakeApi,
    };
    use crate::crawler::RejectReason;
    use crate::riot::GatewayError;
    use crate::state::RankTier;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn tracked_api(matches: &[&str]) -> FakeApi {
        let mut api = FakeApi::default().with_player("p1", Some(RankTier::Diamond), &[]);
        for id in matches {
            api = api.with_match(ranked_match(id, "14.5.1.1", &["p1"]));
        }
        api
    }

    #[test]
    fn test_classify_rate_limit_wins() {
        let results = vec![
            Ok(Settlement::Ingested),
            Err(MatchError::Unknown("boom".to_string())),
            Err(MatchError::RateLimited),
        ];
        assert_eq!(
            BatchOutcome::classify(&results),
            BatchOutcome::RateLimited { size: 3 }
        );
    }

    #[test]
    fn test_classify_tally() {
        let results = vec![
            Ok(Settlement::Ingested),
            Ok(Settlement::Missing),
            Ok(Settlement::Rejected(RejectReason::Tier(RankTier::Gold))),
            Ok(Settlement::Ingested),
        ];
        assert_eq!(
            BatchOutcome::classify(&results),
            BatchOutcome::Complete(BatchTally {
                ingested: 2,
                rejected: 1,
                missing: 1,
            })
        );

        let failed = vec![Ok(Settlement::Ingested), Err(MatchError::Unknown("x".into()))];
        assert!(matches!(
            BatchOutcome::classify(&failed),
            BatchOutcome::Failed { tally: BatchTally { ingested: 1, .. }, .. }
        ));
    }

    #[test]
    fn test_next_state() {
        let done = BatchOutcome::Complete(BatchTally::default());
        assert_eq!(done.next_state(true), SchedulerState::Idle);
        assert_eq!(done.next_state(false), SchedulerState::BatchRunning);
        assert_eq!(
            BatchOutcome::RateLimited { size: 1 }.next_state(false),
            SchedulerState::Cooldown
        );
        assert_eq!(BatchOutcome::Empty.next_state(true), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn test_rate_limited_batch_is_requeued_unchanged() {
        let api = FakeApi::default()
            .with_player("p1", Some(RankTier::Diamond), &["x", "y"])
            .with_match(ranked_match("a", "14.5.1.1", &["p1"]))
            .with_match(ranked_match("c", "14.5.1.1", &["p1"]))
            .script_match(
                "b",
                vec![
                    Err(GatewayError::RateLimited),
                    Ok(ranked_match("b", "14.5.1.1", &["p1"])),
                ],
            );
        let h = harness(api);
        h.enqueue(&["a", "b", "c"]);
        let finished_before = h.crawler.finished_count().unwrap();

        let outcome = h.scheduler().step().await.unwrap();

        assert_eq!(outcome, BatchOutcome::RateLimited { size: 3 });
        assert_eq!(
            h.crawler.frontier_snapshot().unwrap(),
            ids(&["a", "b", "c", "x", "y"])
        );
        assert_eq!(h.crawler.finished_count().unwrap(), finished_before);
        assert!(h.notifier.contains("Rate limited"));

        // The retry runs the same three ids even though the batch size allows more
        let outcome = h.scheduler().step().await.unwrap();

        assert_eq!(
            outcome,
            BatchOutcome::Complete(BatchTally {
                ingested: 3,
                rejected: 0,
                missing: 0,
            })
        );
        assert_eq!(h.crawler.frontier_snapshot().unwrap(), ids(&["x", "y"]));
        for id in ["a", "b", "c"] {
            assert!(h.is_finished(id), "{} should be finished", id);
        }
    }

    #[tokio::test]
    async fn test_cancel_during_rate_limited_batch_releases_ids() {
        let api = tracked_api(&["a", "c"])
            .script_match("b", vec![Err(GatewayError::RateLimited)]);
        let h = harness(api);
        h.enqueue(&["a", "b", "c"]);
        let handle = h.crawler.handle();
        h.api.on_get_match(move |_| {
            handle.cancel();
        });

        let summary = h.scheduler().run().await.unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.rate_limit_retries, 1);
        assert!(h.crawler.frontier_snapshot().unwrap().is_empty());
        assert_eq!(h.crawler.finished_count().unwrap(), 0);
        assert_eq!(
            with_frontier(h.crawler.frontier(), |f| f.in_flight_len()).unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_cancel_cuts_cooldown_short() {
        let api = tracked_api(&["a", "c", "z"])
            .script_match("b", vec![Err(GatewayError::RateLimited)]);
        let mut config = test_config(10);
        config.crawler.batch_cooldown = 60_000;
        let h = harness_from(api, &config);
        h.enqueue(&["a", "b", "c"]);

        let handle = h.crawler.handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.cancel();
        });

        let summary = tokio::time::timeout(Duration::from_secs(5), h.scheduler().run())
            .await
            .expect("cooldown should end on cancel")
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.rate_limit_retries, 1);
        assert!(h.crawler.frontier_snapshot().unwrap().is_empty());
        assert_eq!(h.crawler.finished_count().unwrap(), 0);
        assert_eq!(
            with_frontier(h.crawler.frontier(), |f| f.in_flight_len()).unwrap(),
            0
        );

        // The dropped retry does not shadow ids queued afterwards
        h.enqueue(&["z"]);
        let outcome = h.scheduler().step().await.unwrap();
        assert!(matches!(
            outcome,
            BatchOutcome::Complete(BatchTally { ingested: 1, .. })
        ));
        assert!(h.is_finished("z"));
    }

    #[tokio::test]
    async fn test_retry_after_rate_limit_completes() {
        let api = tracked_api(&["a", "c"]).script_match(
            "b",
            vec![
                Err(GatewayError::RateLimited),
                Ok(ranked_match("b", "14.5.1.1", &["p1"])),
            ],
        );
        let h = harness(api);
        h.enqueue(&["a", "b", "c"]);

        let summary = h.scheduler().run().await.unwrap();

        assert_eq!(summary.rate_limit_retries, 1);
        assert_eq!(summary.ingested, 3);
        assert!(!summary.cancelled);
        assert_eq!(h.crawler.finished_count().unwrap(), 3);
        assert!(h.crawler.frontier_snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_failure_finishes_whole_batch() {
        let api = tracked_api(&["a", "c", "d"]).script_match(
            "b",
            vec![Err(GatewayError::Unknown("HTTP 503".to_string()))],
        );
        let h = harness_with(api, 3);
        h.enqueue(&["a", "b", "c", "d"]);

        let outcome = h.scheduler().step().await.unwrap();

        assert!(matches!(
            outcome,
            BatchOutcome::Failed { tally: BatchTally { ingested: 2, .. }, .. }
        ));
        for id in ["a", "b", "c"] {
            assert!(h.is_finished(id), "{} should be finished", id);
        }
        assert_eq!(h.crawler.frontier_snapshot().unwrap(), ids(&["d"]));

        // The loop moves on to the remaining frontier
        let summary = h.scheduler().run().await.unwrap();
        assert_eq!(summary.ingested, 1);
        assert!(h.is_finished("d"));
    }

    #[tokio::test]
    async fn test_discoveries_are_folded_at_the_barrier() {
        let api = FakeApi::default()
            .with_match(ranked_match("a", "14.5.1.1", &["p1"]))
            .with_player("p1", Some(RankTier::Master), &["a", "x", "y"]);
        let h = harness(api);
        h.enqueue(&["a"]);

        h.scheduler().step().await.unwrap();

        // "a" was in flight when discovered and is now finished
        assert_eq!(h.crawler.frontier_snapshot().unwrap(), ids(&["x", "y"]));
        assert!(h.is_finished("a"));
    }

    #[tokio::test]
    async fn test_empty_frontier_is_idle() {
        let h = harness(FakeApi::default());
        assert_eq!(h.scheduler().step().await.unwrap(), BatchOutcome::Empty);

        let summary = h.scheduler().run().await.unwrap();
        assert_eq!(summary, CrawlSummary::default());
    }
}
