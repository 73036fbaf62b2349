//! Participant expansion
//!
//! Resolves participants the crawler has not seen before and, for tracked
//! participants, stages their recent match ids for the frontier. Staged ids
//! are folded into the frontier by the scheduler at the next batch barrier.

use crate::crawler::report::Reporter;
use crate::riot::{solo_queue_tier, GatewayError, RiotApi};
use crate::state::TierBand;
use crate::storage::{self, ParticipantRecord, SharedStorage};
use crate::MatchError;
use std::sync::{Arc, Mutex, PoisonError};

/// Resolves participants and discovers their match histories
pub struct ParticipantExpander {
    api: Arc<dyn RiotApi>,
    storage: SharedStorage,
    band: TierBand,
    reporter: Reporter,
    discovered: Mutex<Vec<String>>,
}

impl ParticipantExpander {
    pub fn new(
        api: Arc<dyn RiotApi>,
        storage: SharedStorage,
        band: TierBand,
        reporter: Reporter,
    ) -> Self {
        Self {
            api,
            storage,
            band,
            reporter,
            discovered: Mutex::new(Vec::new()),
        }
    }

    /// Fetches, stores and (if tracked) expands a participant
    ///
    /// # Returns
    ///
    /// * `Ok(Some(record))` - The participant was resolved and stored
    /// * `Ok(None)` - The profile or rank entries were not found
    /// * `Err(MatchError)` - Rate limited or an unexpected failure
    pub async fn resolve(&self, puuid: &str) -> Result<Option<ParticipantRecord>, MatchError> {
        let profile = match self.api.get_profile(puuid).await {
            Ok(profile) => profile,
            Err(GatewayError::NotFound) => {
                tracing::debug!("Profile not found for participant {}", puuid);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let entries = match self.api.get_rank_entries(&profile.id).await {
            Ok(entries) => entries,
            Err(GatewayError::NotFound) => {
                tracing::debug!("Rank entries not found for participant {}", puuid);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let record = ParticipantRecord {
            puuid: profile.puuid,
            name: profile.name,
            account_id: profile.account_id,
            summoner_id: profile.id,
            ranked_tier: solo_queue_tier(&entries),
        };

        if storage::lock(&self.storage)?.upsert_participant(&record)? {
            tracing::debug!(
                "Stored participant {} ({})",
                record.puuid,
                record
                    .ranked_tier
                    .map_or("unranked", |t| t.to_db_string())
            );
        }

        if record.ranked_tier.is_some_and(|t| self.band.contains(t)) {
            self.discover_matches(puuid).await;
        }

        Ok(Some(record))
    }

    /// Stages a participant's recent match ids for the frontier
    ///
    /// A failed history lookup is reported and otherwise ignored.
    /// Returns the number of ids staged.
    pub async fn discover_matches(&self, puuid: &str) -> usize {
        match self.api.list_match_ids(puuid).await {
            Ok(ids) => {
                let count = ids.len();
                tracing::debug!("Discovered {} matches from participant {}", count, puuid);
                self.discovered
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend(ids);
                count
            }
            Err(e) => {
                self.reporter
                    .warn(format!("Failed to fetch match history for {}: {}", puuid, e));
                0
            }
        }
    }

    /// Drains the staged match ids
    pub fn take_discovered(&self) -> Vec<String> {
        std::mem::take(
            &mut *self
                .discovered
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }
}
