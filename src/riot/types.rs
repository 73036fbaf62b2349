//! Payload types returned by the remote match, summoner and league APIs
//!
//! Only the fields the crawler reads are modelled; everything else in the
//! JSON is ignored.

use crate::state::RankTier;
use serde::Deserialize;
use std::collections::HashMap;

/// Full match details (match-v5)
#[derive(Debug, Clone, Deserialize)]
pub struct MatchPayload {
    pub metadata: MatchMetadata,
    pub info: MatchInfo,
}

impl MatchPayload {
    pub fn match_id(&self) -> &str {
        &self.metadata.match_id
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadata {
    pub match_id: String,
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    pub game_version: String,
    pub game_mode: String,
    pub game_type: String,
    pub queue_id: i64,
    pub game_creation: i64,
    pub game_duration: i64,
    pub participants: Vec<MatchParticipant>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchParticipant {
    pub puuid: String,
    pub participant_id: i64,
    #[serde(default)]
    pub champion_name: String,
    pub team_id: i64,
    #[serde(default)]
    pub team_position: String,
    #[serde(default)]
    pub win: bool,
}

/// Frame-by-frame match timeline (match-v5)
#[derive(Debug, Clone, Deserialize)]
pub struct TimelinePayload {
    pub metadata: TimelineMetadata,
    pub info: TimelineInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineMetadata {
    pub match_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineInfo {
    #[serde(default)]
    pub participants: Vec<TimelineParticipant>,
    pub frames: Vec<TimelineFrame>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineParticipant {
    pub participant_id: i64,
    pub puuid: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineFrame {
    pub timestamp: i64,
    #[serde(default)]
    pub events: Vec<TimelineEvent>,
    /// Keyed by participant id as a string ("1".."10")
    #[serde(default)]
    pub participant_frames: HashMap<String, ParticipantFrame>,
}

/// Timeline events the crawler counts; everything else is `Other`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum TimelineEvent {
    #[serde(rename = "CHAMPION_KILL")]
    ChampionKill {
        #[serde(default)]
        killer_id: i64,
        victim_id: i64,
        #[serde(default)]
        assisting_participant_ids: Vec<i64>,
    },

    #[serde(rename = "WARD_PLACED")]
    WardPlaced {
        #[serde(default)]
        creator_id: i64,
        #[serde(default)]
        ward_type: String,
    },

    #[serde(rename = "WARD_KILL")]
    WardKill {
        #[serde(default)]
        killer_id: i64,
        #[serde(default)]
        ward_type: String,
    },

    #[serde(rename = "BUILDING_KILL")]
    BuildingKill {
        /// Team that owned the destroyed building
        team_id: i64,
        building_type: String,
        #[serde(default)]
        tower_type: Option<String>,
    },

    #[serde(rename = "TURRET_PLATE_DESTROYED")]
    TurretPlateDestroyed {
        /// Team that owned the plate
        team_id: i64,
    },

    #[serde(rename = "ELITE_MONSTER_KILL")]
    EliteMonsterKill {
        killer_team_id: i64,
        monster_type: String,
        #[serde(default)]
        monster_sub_type: Option<String>,
    },

    #[serde(other)]
    Other,
}

/// Per-participant snapshot inside a timeline frame
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantFrame {
    pub participant_id: i64,
    pub current_gold: i64,
    pub total_gold: i64,
    pub gold_per_second: i64,
    pub xp: i64,
    pub level: i64,
    pub minions_killed: i64,
    pub jungle_minions_killed: i64,
    pub time_enemy_spent_controlled: i64,
    pub position: Position,
    pub champion_stats: ChampionStats,
    pub damage_stats: DamageStats,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChampionStats {
    pub health: i64,
    pub health_max: i64,
    pub attack_damage: i64,
    pub ability_power: i64,
    pub armor: i64,
    pub magic_resist: i64,
    pub movement_speed: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DamageStats {
    pub total_damage_done_to_champions: i64,
    pub total_damage_taken: i64,
}

/// Summoner profile (summoner-v4)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonerProfile {
    pub puuid: String,
    /// Encrypted summoner id, the key for league lookups
    pub id: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub summoner_level: i64,
}

/// One league entry (league-v4)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankEntry {
    pub queue_type: String,
    /// Unknown tier labels are treated as unranked
    #[serde(default, deserialize_with = "lenient_tier")]
    pub tier: Option<RankTier>,
}

fn lenient_tier<'de, D>(deserializer: D) -> Result<Option<RankTier>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let label: Option<String> = Option::deserialize(deserializer)?;
    Ok(label.as_deref().and_then(RankTier::from_db_string))
}

/// Queue whose rank decides a participant's tier
pub const RANKED_SOLO_QUEUE: &str = "RANKED_SOLO_5x5";

/// Picks the solo-queue tier out of a participant's league entries
pub fn solo_queue_tier(entries: &[RankEntry]) -> Option<RankTier> {
    entries
        .iter()
        .find(|e| e.queue_type == RANKED_SOLO_QUEUE)
        .and_then(|e| e.tier)
}
