//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.
//! Writes use `INSERT OR IGNORE` so re-ingesting a row is a no-op.

use crate::state::RankTier;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    MatchRecord, ParticipantRecord, PlayerInherentRecord, PlayerTimestampRecord, RunRecord,
    RunStatus, TeamTimestampRecord,
};
use crate::CrawlError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(CrawlError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, CrawlError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, CrawlError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn read_run(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            config_hash: row.get(3)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                .unwrap_or(RunStatus::Failed),
            matches_ingested: row.get::<_, i64>(5)? as u64,
        })
    }
}

/// Encodes tiers as a comma-separated list
fn encode_ranks(ranks: &[RankTier]) -> String {
    ranks
        .iter()
        .map(|t| t.to_db_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_ranks(encoded: &str) -> StorageResult<Vec<RankTier>> {
    encoded
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            RankTier::from_db_string(s).ok_or_else(|| StorageError::Corrupt {
                table: "matches",
                detail: format!("unknown tier '{}'", s),
            })
        })
        .collect()
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        ingested: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, matches_ingested = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, ingested as i64, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, matches_ingested
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                Self::read_run,
            )
            .optional()?;

        Ok(run)
    }

    // ===== Matches =====

    fn upsert_match(&mut self, record: &MatchRecord) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO matches
             (match_id, ranks, patch, game_creation, game_duration, game_mode, game_type, queue_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.match_id,
                encode_ranks(&record.ranks),
                record.patch,
                record.game_creation,
                record.game_duration,
                record.game_mode,
                record.game_type,
                record.queue_id,
            ],
        )?;
        Ok(inserted > 0)
    }

    fn get_match(&self, match_id: &str) -> StorageResult<Option<MatchRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT match_id, ranks, patch, game_creation, game_duration,
                        COALESCE(game_mode, ''), COALESCE(game_type, ''), queue_id
                 FROM matches WHERE match_id = ?1",
                params![match_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, i64>(7)?,
                    ))
                },
            )
            .optional()?;

        let Some((match_id, ranks, patch, creation, duration, mode, kind, queue)) = row else {
            return Ok(None);
        };

        Ok(Some(MatchRecord {
            match_id,
            ranks: decode_ranks(&ranks)?,
            patch,
            game_creation: creation,
            game_duration: duration,
            game_mode: mode,
            game_type: kind,
            queue_id: queue,
        }))
    }

    fn list_match_ids(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT match_id FROM matches")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    // ===== Participants =====

    fn upsert_participant(&mut self, record: &ParticipantRecord) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO participants (puuid, name, account_id, summoner_id, ranked_tier)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.puuid,
                record.name,
                record.account_id,
                record.summoner_id,
                record.ranked_tier.map(|t| t.to_db_string()),
            ],
        )?;
        Ok(inserted > 0)
    }

    fn get_participant(&self, puuid: &str) -> StorageResult<Option<ParticipantRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT puuid, name, account_id, summoner_id, ranked_tier
                 FROM participants WHERE puuid = ?1",
                params![puuid],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((puuid, name, account_id, summoner_id, tier)) = row else {
            return Ok(None);
        };

        let ranked_tier = match tier {
            Some(label) => Some(RankTier::from_db_string(&label).ok_or_else(|| {
                StorageError::Corrupt {
                    table: "participants",
                    detail: format!("unknown tier '{}'", label),
                }
            })?),
            None => None,
        };

        Ok(Some(ParticipantRecord {
            puuid,
            name,
            account_id,
            summoner_id,
            ranked_tier,
        }))
    }

    fn list_participant_ids(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT puuid FROM participants")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    // ===== Statistics rows =====

    fn insert_player_inherents(
        &mut self,
        records: &[PlayerInherentRecord],
    ) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO player_inherents
                 (match_id, participant_id, champion_name, puuid, team_id, team_position, win)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for r in records {
                inserted += stmt.execute(params![
                    r.match_id,
                    r.participant_id,
                    r.champion_name,
                    r.puuid,
                    r.team_id,
                    r.team_position,
                    r.win,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn insert_team_timestamps(&mut self, records: &[TeamTimestampRecord]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO team_timestamps
                 (match_id, team_id, timestamp, baron_kills, horde_kills,
                  earth_dragon_kills, fire_dragon_kills, water_dragon_kills, air_dragon_kills,
                  elder_dragon_kills, chem_dragon_kills, hex_dragon_kills, rift_herald_kills,
                  outer_turret_kills, inner_turret_kills, base_turret_kills, nexus_turret_kills,
                  inhibitor_kills, turret_plate_kills)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                         ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
            )?;
            for r in records {
                let c = &r.counters;
                inserted += stmt.execute(params![
                    r.match_id,
                    r.team_id,
                    r.timestamp,
                    c.baron_kills,
                    c.horde_kills,
                    c.earth_dragon_kills,
                    c.fire_dragon_kills,
                    c.water_dragon_kills,
                    c.air_dragon_kills,
                    c.elder_dragon_kills,
                    c.chem_dragon_kills,
                    c.hex_dragon_kills,
                    c.rift_herald_kills,
                    c.outer_turret_kills,
                    c.inner_turret_kills,
                    c.base_turret_kills,
                    c.nexus_turret_kills,
                    c.inhibitor_kills,
                    c.turret_plate_kills,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn insert_player_timestamps(
        &mut self,
        records: &[PlayerTimestampRecord],
    ) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO player_timestamps
                 (match_id, participant_id, timestamp, current_gold, total_gold,
                  gold_per_second, xp, level, minions_killed, jungle_minions_killed,
                  time_enemy_spent_controlled, x, y, health, health_max, attack_damage,
                  ability_power, armor, magic_resist, movement_speed,
                  total_damage_done_to_champions, total_damage_taken,
                  kills, deaths, assists, wards_placed, wards_killed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                         ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20,
                         ?21, ?22, ?23, ?24, ?25, ?26, ?27)",
            )?;
            for r in records {
                inserted += stmt.execute(params![
                    r.match_id,
                    r.participant_id,
                    r.timestamp,
                    r.current_gold,
                    r.total_gold,
                    r.gold_per_second,
                    r.xp,
                    r.level,
                    r.minions_killed,
                    r.jungle_minions_killed,
                    r.time_enemy_spent_controlled,
                    r.x,
                    r.y,
                    r.health,
                    r.health_max,
                    r.attack_damage,
                    r.ability_power,
                    r.armor,
                    r.magic_resist,
                    r.movement_speed,
                    r.total_damage_done_to_champions,
                    r.total_damage_taken,
                    r.counters.kills,
                    r.counters.deaths,
                    r.counters.assists,
                    r.counters.wards_placed,
                    r.counters.wards_killed,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    // ===== Statistics =====

    fn count_matches(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_participants(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM participants", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_participants_by_tier(&self) -> StorageResult<Vec<(Option<RankTier>, u64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT ranked_tier, COUNT(*) FROM participants GROUP BY ranked_tier")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut breakdown = Vec::new();
        for row in rows {
            let (label, count) = row?;
            // Unknown labels fold into unranked rather than failing the report
            let tier = label.as_deref().and_then(RankTier::from_db_string);
            breakdown.push((tier, count as u64));
        }

        breakdown.sort_by_key(|(tier, _)| *tier);
        Ok(breakdown)
    }

    fn count_matches_by_patch(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT patch, COUNT(*) FROM matches GROUP BY patch ORDER BY patch")?;

        let patches = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(patches)
    }
}
