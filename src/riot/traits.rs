//! Remote API trait and error types
//!
//! This module defines the interface the crawl core uses to reach the
//! remote match, summoner and league services, and the closed set of
//! failures those calls can report.

use crate::riot::types::{MatchPayload, RankEntry, SummonerProfile, TimelinePayload};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when calling the remote API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("not found")]
    NotFound,

    #[error("rate limited")]
    RateLimited,

    #[error("{0}")]
    Unknown(String),
}

/// Result type for remote API calls
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Remote data source for matches and participants
///
/// Implementations must be shareable across the concurrent tasks of a batch.
#[async_trait]
pub trait RiotApi: Send + Sync {
    /// Lists recent match ids for a participant
    async fn list_match_ids(&self, puuid: &str) -> GatewayResult<Vec<String>>;

    /// Fetches full match details
    async fn get_match(&self, match_id: &str) -> GatewayResult<MatchPayload>;

    /// Fetches the frame-by-frame timeline of a match
    async fn get_timeline(&self, match_id: &str) -> GatewayResult<TimelinePayload>;

    /// Fetches a participant's profile
    async fn get_profile(&self, puuid: &str) -> GatewayResult<SummonerProfile>;

    /// Fetches league entries for a profile's summoner id
    async fn get_rank_entries(&self, summoner_id: &str) -> GatewayResult<Vec<RankEntry>>;
}
