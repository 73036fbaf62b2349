//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::RankTier;
use crate::storage::{
    MatchRecord, ParticipantRecord, PlayerInherentRecord, PlayerTimestampRecord, RunRecord,
    RunStatus, TeamTimestampRecord,
};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Corrupt row in {table}: {detail}")]
    Corrupt { table: &'static str, detail: String },

    #[error("Storage lock poisoned")]
    Poisoned,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every write is idempotent: writing a row whose key already exists is a
/// successful no-op, never an error.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run finished with its final status and ingestion count
    fn finish_run(&mut self, run_id: i64, status: RunStatus, ingested: u64)
        -> StorageResult<()>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Matches =====

    /// Stores a match summary
    ///
    /// # Returns
    ///
    /// `true` if the row was new, `false` if the match was already stored
    fn upsert_match(&mut self, record: &MatchRecord) -> StorageResult<bool>;

    /// Gets a stored match summary
    fn get_match(&self, match_id: &str) -> StorageResult<Option<MatchRecord>>;

    /// Lists the ids of every stored match
    fn list_match_ids(&self) -> StorageResult<Vec<String>>;

    // ===== Participants =====

    /// Stores a participant profile
    ///
    /// # Returns
    ///
    /// `true` if the row was new, `false` if the participant was already stored
    fn upsert_participant(&mut self, record: &ParticipantRecord) -> StorageResult<bool>;

    /// Looks up a stored participant by puuid
    fn get_participant(&self, puuid: &str) -> StorageResult<Option<ParticipantRecord>>;

    /// Lists the puuids of every stored participant
    fn list_participant_ids(&self) -> StorageResult<Vec<String>>;

    // ===== Statistics rows =====

    /// Stores per-participant rows for a match, returning how many were new
    fn insert_player_inherents(&mut self, records: &[PlayerInherentRecord])
        -> StorageResult<usize>;

    /// Stores per-team timeline rows, returning how many were new
    fn insert_team_timestamps(&mut self, records: &[TeamTimestampRecord]) -> StorageResult<usize>;

    /// Stores per-participant timeline rows, returning how many were new
    fn insert_player_timestamps(
        &mut self,
        records: &[PlayerTimestampRecord],
    ) -> StorageResult<usize>;

    // ===== Statistics =====

    /// Gets total match count
    fn count_matches(&self) -> StorageResult<u64>;

    /// Gets total participant count
    fn count_participants(&self) -> StorageResult<u64>;

    /// Gets participant counts per tier, unranked as `None`, ordered up the ladder
    fn count_participants_by_tier(&self) -> StorageResult<Vec<(Option<RankTier>, u64)>>;

    /// Gets match counts per patch, ordered by patch string
    fn count_matches_by_patch(&self) -> StorageResult<Vec<(String, u64)>>;
}
