//! Per-match pipeline: fetch, validate, extract, persist
//!
//! `process` is the per-match error boundary. Not-found and rejected matches
//! settle here; only rate limits and unexpected failures reach the scheduler.

use crate::crawler::extract::{player_inherents, timeline_records};
use crate::crawler::report::Reporter;
use crate::crawler::validator::{MatchValidator, RejectReason, ValidationOutcome};
use crate::riot::RiotApi;
use crate::storage::{self, SharedStorage};
use crate::MatchError;
use std::sync::Arc;

/// How a match left the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// Accepted and stored with its statistics
    Ingested,

    /// Permanently out of scope
    Rejected(RejectReason),

    /// The remote API has no such match or timeline
    Missing,
}

/// Runs a single match from id to stored statistics
pub struct MatchPipeline {
    api: Arc<dyn RiotApi>,
    storage: SharedStorage,
    validator: MatchValidator,
    reporter: Reporter,
}

impl MatchPipeline {
    pub fn new(
        api: Arc<dyn RiotApi>,
        storage: SharedStorage,
        validator: MatchValidator,
        reporter: Reporter,
    ) -> Self {
        Self {
            api,
            storage,
            validator,
            reporter,
        }
    }

    /// Processes one match and settles the outcome
    ///
    /// # Returns
    ///
    /// * `Ok(Settlement)` - The match is done for this session
    /// * `Err(MatchError::RateLimited)` - The batch should be retried
    /// * `Err(MatchError::Unknown)` - Unexpected failure
    pub async fn process(&self, match_id: &str) -> Result<Settlement, MatchError> {
        let result = self.ingest(match_id).await;
        self.settle(match_id, result)
    }

    async fn ingest(&self, match_id: &str) -> Result<(), MatchError> {
        let payload = self.api.get_match(match_id).await?;

        if let ValidationOutcome::Rejected(reason) = self.validator.validate(&payload).await? {
            return Err(MatchError::ValidationRejected(reason));
        }

        let inherents = player_inherents(&payload);
        storage::lock(&self.storage)?.insert_player_inherents(&inherents)?;

        let timeline = self.api.get_timeline(match_id).await?;
        let rows = timeline_records(&timeline);
        {
            let mut storage = storage::lock(&self.storage)?;
            storage.insert_team_timestamps(&rows.teams)?;
            storage.insert_player_timestamps(&rows.players)?;
        }

        tracing::debug!(
            "Stored {} team rows and {} participant rows for {}",
            rows.teams.len(),
            rows.players.len(),
            match_id
        );
        Ok(())
    }

    /// Absorbs final per-match outcomes and passes retryable ones through
    pub fn settle(
        &self,
        match_id: &str,
        result: Result<(), MatchError>,
    ) -> Result<Settlement, MatchError> {
        match result {
            Ok(()) => {
                self.reporter.shout(format!("Ingested match {}", match_id));
                Ok(Settlement::Ingested)
            }
            Err(MatchError::NotFound) => {
                self.reporter.warn(format!("Match {} not found", match_id));
                Ok(Settlement::Missing)
            }
            Err(MatchError::ValidationRejected(reason)) => {
                self.reporter
                    .shout(format!("Rejected match {}: {}", match_id, reason));
                Ok(Settlement::Rejected(reason))
            }
            Err(MatchError::RateLimited) => {
                tracing::debug!("Rate limited while processing {}", match_id);
                Err(MatchError::RateLimited)
            }
            Err(MatchError::Unknown(cause)) => {
                self.reporter
                    .error(format!("Failed to process match {}: {}", match_id, cause));
                Err(MatchError::Unknown(cause))
            }
        }
    }
}
