//! Remote data gateway for match, timeline, summoner and league data
//!
//! The crawl core only depends on the `RiotApi` trait; `RiotClient` is the
//! HTTP implementation used by the binary.

mod client;
mod traits;
mod types;

pub use client::{build_http_client, classify_status, RiotClient, API_KEY_HEADER};
pub use traits::{GatewayError, GatewayResult, RiotApi};
pub use types::{
    solo_queue_tier, ChampionStats, DamageStats, MatchInfo, MatchMetadata, MatchParticipant,
    MatchPayload, ParticipantFrame, Position, RankEntry, SummonerProfile, TimelineEvent,
    TimelineFrame, TimelineInfo, TimelineMetadata, TimelineParticipant, TimelinePayload,
    RANKED_SOLO_QUEUE,
};
