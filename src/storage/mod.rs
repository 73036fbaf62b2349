//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Match summaries and participant profiles
//! - Per-frame team and participant statistics
//! - Run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::RankTier;
use crate::CrawlError;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage shared between the concurrent tasks of a crawl
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// Wraps a storage backend for sharing across tasks
pub fn shared<S: Storage + Send + 'static>(storage: S) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// Locks shared storage for a single call
///
/// The guard must not be held across an `.await`.
pub fn lock(
    storage: &SharedStorage,
) -> StorageResult<MutexGuard<'_, dyn Storage + Send + 'static>> {
    storage.lock().map_err(|_| StorageError::Poisoned)
}

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(CrawlError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, CrawlError> {
    SqliteStorage::new(path)
}

/// An accepted match summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub match_id: String,
    /// Tiers of the ranked participants, in participant order
    pub ranks: Vec<RankTier>,
    pub patch: String,
    pub game_creation: i64,
    pub game_duration: i64,
    pub game_mode: String,
    pub game_type: String,
    pub queue_id: i64,
}

/// A resolved participant profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRecord {
    pub puuid: String,
    pub name: String,
    pub account_id: String,
    /// Internal id used for rank lookups
    pub summoner_id: String,
    pub ranked_tier: Option<RankTier>,
}

/// Per-participant facts of an accepted match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInherentRecord {
    pub match_id: String,
    pub participant_id: i64,
    pub champion_name: String,
    pub puuid: String,
    pub team_id: i64,
    pub team_position: String,
    pub win: bool,
}

/// Cumulative objective counters for one team
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamCounters {
    pub baron_kills: u32,
    pub horde_kills: u32,
    pub earth_dragon_kills: u32,
    pub fire_dragon_kills: u32,
    pub water_dragon_kills: u32,
    pub air_dragon_kills: u32,
    pub elder_dragon_kills: u32,
    pub chem_dragon_kills: u32,
    pub hex_dragon_kills: u32,
    pub rift_herald_kills: u32,
    pub outer_turret_kills: u32,
    pub inner_turret_kills: u32,
    pub base_turret_kills: u32,
    pub nexus_turret_kills: u32,
    pub inhibitor_kills: u32,
    pub turret_plate_kills: u32,
}

/// Team counters as of one timeline frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamTimestampRecord {
    pub match_id: String,
    pub team_id: i64,
    pub timestamp: i64,
    pub counters: TeamCounters,
}

/// Cumulative combat and vision counters for one participant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerCounters {
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub wards_placed: u32,
    pub wards_killed: u32,
}

/// Participant snapshot as of one timeline frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerTimestampRecord {
    pub match_id: String,
    pub participant_id: i64,
    pub timestamp: i64,
    pub current_gold: i64,
    pub total_gold: i64,
    pub gold_per_second: i64,
    pub xp: i64,
    pub level: i64,
    pub minions_killed: i64,
    pub jungle_minions_killed: i64,
    pub time_enemy_spent_controlled: i64,
    pub x: i64,
    pub y: i64,
    pub health: i64,
    pub health_max: i64,
    pub attack_damage: i64,
    pub ability_power: i64,
    pub armor: i64,
    pub magic_resist: i64,
    pub movement_speed: i64,
    pub total_damage_done_to_champions: i64,
    pub total_damage_taken: i64,
    pub counters: PlayerCounters,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub matches_ingested: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
