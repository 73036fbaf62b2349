//! Match validation
//!
//! Decides whether a fetched match is in scope: whitelisted patch, ranked
//! solo/duo on Summoner's Rift, and every ranked participant inside the
//! tracked tier band. Accepted matches are stored before being returned.

use crate::crawler::expander::ParticipantExpander;
use crate::riot::MatchPayload;
use crate::state::{PatchVersion, RankTier, TierBand};
use crate::storage::{self, MatchRecord, SharedStorage};
use crate::MatchError;
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;

/// Game mode of Summoner's Rift matches
pub const CLASSIC_MODE: &str = "CLASSIC";

/// Game type of matchmade games
pub const MATCHED_GAME: &str = "MATCHED_GAME";

/// Queue id of ranked solo/duo
pub const RANKED_SOLO_QUEUE_ID: i64 = 420;

/// Why a match was permanently rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Patch not in the whitelist
    Patch(PatchVersion),

    /// Not ranked solo/duo on Summoner's Rift
    GameMode { mode: String, kind: String, queue: i64 },

    /// A ranked participant outside the tracked band
    Tier(RankTier),

    /// Game version without a `major.minor` prefix
    MalformedVersion(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Patch(patch) => write!(f, "patch {} not whitelisted", patch),
            Self::GameMode { mode, kind, queue } => {
                write!(f, "game mode {}/{} on queue {}", mode, kind, queue)
            }
            Self::Tier(tier) => write!(f, "participant tier {} outside band", tier),
            Self::MalformedVersion(version) => write!(f, "malformed game version '{}'", version),
        }
    }
}

/// Result of validating a match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// In scope; the stored summary
    Accepted(MatchRecord),
    Rejected(RejectReason),
}

/// Applies the patch, game mode and tier filters to fetched matches
pub struct MatchValidator {
    expander: Arc<ParticipantExpander>,
    storage: SharedStorage,
    band: TierBand,
    patches: Vec<PatchVersion>,
}

impl MatchValidator {
    pub fn new(
        expander: Arc<ParticipantExpander>,
        storage: SharedStorage,
        band: TierBand,
        patches: Vec<PatchVersion>,
    ) -> Self {
        Self {
            expander,
            storage,
            band,
            patches,
        }
    }

    /// Derives the match's patch and checks it against the whitelist
    pub fn check_patch(&self, payload: &MatchPayload) -> Result<PatchVersion, RejectReason> {
        let version = &payload.info.game_version;
        let patch = PatchVersion::from_game_version(version)
            .ok_or_else(|| RejectReason::MalformedVersion(version.clone()))?;

        if self.patches.contains(&patch) {
            Ok(patch)
        } else {
            Err(RejectReason::Patch(patch))
        }
    }

    /// Requires ranked solo/duo on Summoner's Rift
    pub fn check_game_mode(payload: &MatchPayload) -> Result<(), RejectReason> {
        let info = &payload.info;
        if info.game_mode == CLASSIC_MODE
            && info.game_type == MATCHED_GAME
            && info.queue_id == RANKED_SOLO_QUEUE_ID
        {
            Ok(())
        } else {
            Err(RejectReason::GameMode {
                mode: info.game_mode.clone(),
                kind: info.game_type.clone(),
                queue: info.queue_id,
            })
        }
    }

    /// Rejects on the first tier outside the band
    pub fn check_tiers(&self, tiers: &[RankTier]) -> Result<(), RejectReason> {
        match tiers.iter().find(|t| !self.band.contains(**t)) {
            Some(tier) => Err(RejectReason::Tier(*tier)),
            None => Ok(()),
        }
    }

    /// Validates a match, storing it when accepted
    ///
    /// Permanent rejections come back as `Ok(Rejected)`; rate limits and
    /// unexpected failures while resolving participants as `Err`.
    pub async fn validate(&self, payload: &MatchPayload) -> Result<ValidationOutcome, MatchError> {
        let patch = match self.check_patch(payload) {
            Ok(patch) => patch,
            Err(reason) => return Ok(ValidationOutcome::Rejected(reason)),
        };

        if let Err(reason) = Self::check_game_mode(payload) {
            return Ok(ValidationOutcome::Rejected(reason));
        }

        let tiers = self.resolve_tiers(payload).await?;
        if let Err(reason) = self.check_tiers(&tiers) {
            return Ok(ValidationOutcome::Rejected(reason));
        }

        let info = &payload.info;
        let record = MatchRecord {
            match_id: payload.match_id().to_string(),
            ranks: tiers,
            patch: patch.to_string(),
            game_creation: info.game_creation,
            game_duration: info.game_duration,
            game_mode: info.game_mode.clone(),
            game_type: info.game_type.clone(),
            queue_id: info.queue_id,
        };

        storage::lock(&self.storage)?.upsert_match(&record)?;
        Ok(ValidationOutcome::Accepted(record))
    }

    /// Resolves every participant's tier concurrently
    ///
    /// Unranked and unresolvable participants are left out. When lookups
    /// fail, a rate limit wins over any other error.
    async fn resolve_tiers(&self, payload: &MatchPayload) -> Result<Vec<RankTier>, MatchError> {
        let lookups = payload
            .info
            .participants
            .iter()
            .map(|p| self.participant_tier(&p.puuid));
        let results = join_all(lookups).await;

        let mut tiers = Vec::new();
        let mut failure = None;
        for result in results {
            match result {
                Ok(Some(tier)) => tiers.push(tier),
                Ok(None) => {}
                Err(MatchError::RateLimited) => return Err(MatchError::RateLimited),
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(tiers),
        }
    }

    async fn participant_tier(&self, puuid: &str) -> Result<Option<RankTier>, MatchError> {
        let known = storage::lock(&self.storage)?.get_participant(puuid)?;
        if let Some(record) = known {
            return Ok(record.ranked_tier);
        }

        let resolved = self.expander.resolve(puuid).await?;
        Ok(resolved.and_then(|r| r.ranked_tier))
    }
}
