//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the crawler database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    matches_ingested INTEGER NOT NULL DEFAULT 0
);

-- Accepted match summaries
CREATE TABLE IF NOT EXISTS matches (
    match_id TEXT PRIMARY KEY,
    ranks TEXT NOT NULL,
    patch TEXT NOT NULL,
    game_creation INTEGER NOT NULL,
    game_duration INTEGER NOT NULL,
    game_mode TEXT,
    game_type TEXT,
    queue_id INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_matches_patch ON matches(patch);

-- Resolved participant profiles
CREATE TABLE IF NOT EXISTS participants (
    puuid TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    account_id TEXT NOT NULL,
    summoner_id TEXT NOT NULL,
    ranked_tier TEXT
);

CREATE INDEX IF NOT EXISTS idx_participants_tier ON participants(ranked_tier);

-- Per-participant facts of an accepted match
CREATE TABLE IF NOT EXISTS player_inherents (
    match_id TEXT NOT NULL REFERENCES matches(match_id),
    participant_id INTEGER NOT NULL,
    champion_name TEXT NOT NULL,
    puuid TEXT NOT NULL,
    team_id INTEGER NOT NULL,
    team_position TEXT NOT NULL,
    win INTEGER NOT NULL,
    PRIMARY KEY (match_id, participant_id)
);

CREATE INDEX IF NOT EXISTS idx_player_inherents_puuid ON player_inherents(puuid);

-- Cumulative team objectives after each timeline frame
CREATE TABLE IF NOT EXISTS team_timestamps (
    match_id TEXT NOT NULL REFERENCES matches(match_id),
    team_id INTEGER NOT NULL,
    timestamp INTEGER NOT NULL,
    baron_kills INTEGER NOT NULL,
    horde_kills INTEGER NOT NULL,
    earth_dragon_kills INTEGER NOT NULL,
    fire_dragon_kills INTEGER NOT NULL,
    water_dragon_kills INTEGER NOT NULL,
    air_dragon_kills INTEGER NOT NULL,
    elder_dragon_kills INTEGER NOT NULL,
    chem_dragon_kills INTEGER NOT NULL,
    hex_dragon_kills INTEGER NOT NULL,
    rift_herald_kills INTEGER NOT NULL,
    outer_turret_kills INTEGER NOT NULL,
    inner_turret_kills INTEGER NOT NULL,
    base_turret_kills INTEGER NOT NULL,
    nexus_turret_kills INTEGER NOT NULL,
    inhibitor_kills INTEGER NOT NULL,
    turret_plate_kills INTEGER NOT NULL,
    PRIMARY KEY (match_id, team_id, timestamp)
);

-- Participant snapshot and cumulative counters after each timeline frame
CREATE TABLE IF NOT EXISTS player_timestamps (
    match_id TEXT NOT NULL REFERENCES matches(match_id),
    participant_id INTEGER NOT NULL,
    timestamp INTEGER NOT NULL,
    current_gold INTEGER NOT NULL,
    total_gold INTEGER NOT NULL,
    gold_per_second INTEGER NOT NULL,
    xp INTEGER NOT NULL,
    level INTEGER NOT NULL,
    minions_killed INTEGER NOT NULL,
    jungle_minions_killed INTEGER NOT NULL,
    time_enemy_spent_controlled INTEGER NOT NULL,
    x INTEGER NOT NULL,
    y INTEGER NOT NULL,
    health INTEGER NOT NULL,
    health_max INTEGER NOT NULL,
    attack_damage INTEGER NOT NULL,
    ability_power INTEGER NOT NULL,
    armor INTEGER NOT NULL,
    magic_resist INTEGER NOT NULL,
    movement_speed INTEGER NOT NULL,
    total_damage_done_to_champions INTEGER NOT NULL,
    total_damage_taken INTEGER NOT NULL,
    kills INTEGER NOT NULL,
    deaths INTEGER NOT NULL,
    assists INTEGER NOT NULL,
    wards_placed INTEGER NOT NULL,
    wards_killed INTEGER NOT NULL,
    PRIMARY KEY (match_id, participant_id, timestamp)
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
