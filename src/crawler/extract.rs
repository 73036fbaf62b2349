//! Statistics extraction from accepted matches and their timelines
//!
//! Timelines are walked frame by frame with running counters, so every
//! emitted row holds totals as of that frame's timestamp.

use crate::riot::{MatchPayload, ParticipantFrame, TimelineEvent, TimelinePayload};
use crate::storage::{
    PlayerCounters, PlayerInherentRecord, PlayerTimestampRecord, TeamCounters,
    TeamTimestampRecord,
};
use std::collections::{BTreeMap, HashMap};

pub const BLUE_TEAM: i64 = 100;
pub const RED_TEAM: i64 = 200;

/// Ward types that count towards vision statistics
const COUNTED_WARDS: [&str; 4] = ["YELLOW_TRINKET", "CONTROL_WARD", "SIGHT_WARD", "BLUE_TRINKET"];

/// Rows produced from one timeline
#[derive(Debug, Clone, Default)]
pub struct TimelineRecords {
    pub teams: Vec<TeamTimestampRecord>,
    pub players: Vec<PlayerTimestampRecord>,
}

/// One row per participant of an accepted match
pub fn player_inherents(payload: &MatchPayload) -> Vec<PlayerInherentRecord> {
    payload
        .info
        .participants
        .iter()
        .map(|p| PlayerInherentRecord {
            match_id: payload.match_id().to_string(),
            participant_id: p.participant_id,
            champion_name: p.champion_name.clone(),
            puuid: p.puuid.clone(),
            team_id: p.team_id,
            team_position: p.team_position.clone(),
            win: p.win,
        })
        .collect()
}

/// Walks a timeline and emits cumulative team and participant rows per frame
pub fn timeline_records(timeline: &TimelinePayload) -> TimelineRecords {
    let match_id = &timeline.metadata.match_id;
    let mut teams: BTreeMap<i64, TeamCounters> = [BLUE_TEAM, RED_TEAM]
        .into_iter()
        .map(|team| (team, TeamCounters::default()))
        .collect();
    let mut players: HashMap<i64, PlayerCounters> = timeline
        .info
        .participants
        .iter()
        .map(|p| (p.participant_id, PlayerCounters::default()))
        .collect();

    let mut records = TimelineRecords::default();

    for frame in &timeline.info.frames {
        for event in &frame.events {
            apply_event(event, &mut teams, &mut players);
        }

        for (team_id, counters) in &teams {
            records.teams.push(TeamTimestampRecord {
                match_id: match_id.clone(),
                team_id: *team_id,
                timestamp: frame.timestamp,
                counters: *counters,
            });
        }

        let mut snapshots: Vec<&ParticipantFrame> = frame.participant_frames.values().collect();
        snapshots.sort_by_key(|p| p.participant_id);

        for snapshot in snapshots {
            let counters = players
                .get(&snapshot.participant_id)
                .copied()
                .unwrap_or_default();
            records
                .players
                .push(player_row(match_id, frame.timestamp, snapshot, counters));
        }
    }

    records
}

/// Team credited for destroying a structure owned by `owner`
fn opposing_team(owner: i64) -> Option<i64> {
    match owner {
        BLUE_TEAM => Some(RED_TEAM),
        RED_TEAM => Some(BLUE_TEAM),
        _ => None,
    }
}

fn apply_event(
    event: &TimelineEvent,
    teams: &mut BTreeMap<i64, TeamCounters>,
    players: &mut HashMap<i64, PlayerCounters>,
) {
    match event {
        TimelineEvent::ChampionKill {
            killer_id,
            victim_id,
            assisting_participant_ids,
        } => {
            // Killer 0 means an execution by minions, turrets or monsters
            if *killer_id != 0 {
                players.entry(*killer_id).or_default().kills += 1;
            }
            players.entry(*victim_id).or_default().deaths += 1;
            for id in assisting_participant_ids {
                players.entry(*id).or_default().assists += 1;
            }
        }
        TimelineEvent::WardPlaced {
            creator_id,
            ward_type,
        } => {
            if COUNTED_WARDS.contains(&ward_type.as_str()) {
                players.entry(*creator_id).or_default().wards_placed += 1;
            }
        }
        TimelineEvent::WardKill {
            killer_id,
            ward_type,
        } => {
            if COUNTED_WARDS.contains(&ward_type.as_str()) {
                players.entry(*killer_id).or_default().wards_killed += 1;
            }
        }
        TimelineEvent::BuildingKill {
            team_id,
            building_type,
            tower_type,
        } => {
            let Some(counters) = opposing_team(*team_id).and_then(|t| teams.get_mut(&t)) else {
                return;
            };
            match (building_type.as_str(), tower_type.as_deref()) {
                ("TOWER_BUILDING", Some("OUTER_TURRET")) => counters.outer_turret_kills += 1,
                ("TOWER_BUILDING", Some("INNER_TURRET")) => counters.inner_turret_kills += 1,
                ("TOWER_BUILDING", Some("BASE_TURRET")) => counters.base_turret_kills += 1,
                ("TOWER_BUILDING", Some("NEXUS_TURRET")) => counters.nexus_turret_kills += 1,
                ("INHIBITOR_BUILDING", _) => counters.inhibitor_kills += 1,
                _ => {}
            }
        }
        TimelineEvent::TurretPlateDestroyed { team_id } => {
            if let Some(counters) = opposing_team(*team_id).and_then(|t| teams.get_mut(&t)) {
                counters.turret_plate_kills += 1;
            }
        }
        TimelineEvent::EliteMonsterKill {
            killer_team_id,
            monster_type,
            monster_sub_type,
        } => {
            let Some(counters) = teams.get_mut(killer_team_id) else {
                return;
            };
            match (monster_type.as_str(), monster_sub_type.as_deref()) {
                ("DRAGON", Some("FIRE_DRAGON")) => counters.fire_dragon_kills += 1,
                ("DRAGON", Some("WATER_DRAGON")) => counters.water_dragon_kills += 1,
                ("DRAGON", Some("AIR_DRAGON")) => counters.air_dragon_kills += 1,
                ("DRAGON", Some("EARTH_DRAGON")) => counters.earth_dragon_kills += 1,
                ("DRAGON", Some("ELDER_DRAGON")) => counters.elder_dragon_kills += 1,
                ("DRAGON", Some("CHEMTECH_DRAGON")) => counters.chem_dragon_kills += 1,
                ("DRAGON", Some("HEXTECH_DRAGON")) => counters.hex_dragon_kills += 1,
                ("RIFTHERALD", _) => counters.rift_herald_kills += 1,
                ("BARON_NASHOR", _) => counters.baron_kills += 1,
                ("HORDE", _) => counters.horde_kills += 1,
                _ => {}
            }
        }
        TimelineEvent::Other => {}
    }
}

fn player_row(
    match_id: &str,
    timestamp: i64,
    frame: &ParticipantFrame,
    counters: PlayerCounters,
) -> PlayerTimestampRecord {
    PlayerTimestampRecord {
        match_id: match_id.to_string(),
        participant_id: frame.participant_id,
        timestamp,
        current_gold: frame.current_gold,
        total_gold: frame.total_gold,
        gold_per_second: frame.gold_per_second,
        xp: frame.xp,
        level: frame.level,
        minions_killed: frame.minions_killed,
        jungle_minions_killed: frame.jungle_minions_killed,
        time_enemy_spent_controlled: frame.time_enemy_spent_controlled,
        x: frame.position.x,
        y: frame.position.y,
        health: frame.champion_stats.health,
        health_max: frame.champion_stats.health_max,
        attack_damage: frame.champion_stats.attack_damage,
        ability_power: frame.champion_stats.ability_power,
        armor: frame.champion_stats.armor,
        magic_resist: frame.champion_stats.magic_resist,
        movement_speed: frame.champion_stats.movement_speed,
        total_damage_done_to_champions: frame.damage_stats.total_damage_done_to_champions,
        total_damage_taken: frame.damage_stats.total_damage_taken,
        counters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline(json_frames: &str) -> TimelinePayload {
        let json = format!(
            r#"{{
                "metadata": {{ "matchId": "NA1_1" }},
                "info": {{
                    "participants": [
                        {{ "participantId": 1, "puuid": "p1" }},
                        {{ "participantId": 2, "puuid": "p2" }},
                        {{ "participantId": 6, "puuid": "p6" }}
                    ],
                    "frames": {}
                }}
            }}"#,
            json_frames
        );
        serde_json::from_str(&json).unwrap()
    }

    fn team_row(records: &TimelineRecords, team_id: i64, timestamp: i64) -> TeamCounters {
        records
            .teams
            .iter()
            .find(|r| r.team_id == team_id && r.timestamp == timestamp)
            .map(|r| r.counters)
            .unwrap()
    }

    fn player_counters(records: &TimelineRecords, pid: i64, timestamp: i64) -> PlayerCounters {
        records
            .players
            .iter()
            .find(|r| r.participant_id == pid && r.timestamp == timestamp)
            .map(|r| r.counters)
            .unwrap()
    }

    #[test]
    fn test_kills_deaths_assists_accumulate() {
        let records = timeline_records(&timeline(
            r#"[
                { "timestamp": 0, "events": [], "participantFrames": {
                    "1": { "participantId": 1 }, "2": { "participantId": 2 }, "6": { "participantId": 6 } } },
                { "timestamp": 60000, "events": [
                    { "type": "CHAMPION_KILL", "killerId": 1, "victimId": 6, "assistingParticipantIds": [2] },
                    { "type": "CHAMPION_KILL", "killerId": 0, "victimId": 1 }
                  ], "participantFrames": {
                    "1": { "participantId": 1, "totalGold": 800 }, "2": { "participantId": 2 }, "6": { "participantId": 6 } } }
            ]"#,
        ));

        assert_eq!(records.players.len(), 6);
        assert_eq!(player_counters(&records, 1, 0), PlayerCounters::default());

        let p1 = player_counters(&records, 1, 60000);
        assert_eq!((p1.kills, p1.deaths, p1.assists), (1, 1, 0));
        let p2 = player_counters(&records, 2, 60000);
        assert_eq!((p2.kills, p2.deaths, p2.assists), (0, 0, 1));
        let p6 = player_counters(&records, 6, 60000);
        assert_eq!((p6.kills, p6.deaths), (0, 1));

        let row = records
            .players
            .iter()
            .find(|r| r.participant_id == 1 && r.timestamp == 60000)
            .unwrap();
        assert_eq!(row.total_gold, 800);
    }

    #[test]
    fn test_only_counted_wards() {
        let records = timeline_records(&timeline(
            r#"[
                { "timestamp": 60000, "events": [
                    { "type": "WARD_PLACED", "creatorId": 1, "wardType": "CONTROL_WARD" },
                    { "type": "WARD_PLACED", "creatorId": 1, "wardType": "TEEMO_MUSHROOM" },
                    { "type": "WARD_KILL", "killerId": 2, "wardType": "YELLOW_TRINKET" },
                    { "type": "WARD_KILL", "killerId": 2, "wardType": "UNDEFINED" }
                  ], "participantFrames": {
                    "1": { "participantId": 1 }, "2": { "participantId": 2 } } }
            ]"#,
        ));

        assert_eq!(player_counters(&records, 1, 60000).wards_placed, 1);
        assert_eq!(player_counters(&records, 2, 60000).wards_killed, 1);
    }

    #[test]
    fn test_structures_credit_the_destroying_team() {
        let records = timeline_records(&timeline(
            r#"[
                { "timestamp": 600000, "events": [
                    { "type": "TURRET_PLATE_DESTROYED", "teamId": 200 },
                    { "type": "BUILDING_KILL", "teamId": 200, "buildingType": "TOWER_BUILDING", "towerType": "OUTER_TURRET" },
                    { "type": "BUILDING_KILL", "teamId": 100, "buildingType": "INHIBITOR_BUILDING" }
                  ], "participantFrames": {} }
            ]"#,
        ));

        let blue = team_row(&records, BLUE_TEAM, 600000);
        assert_eq!(blue.turret_plate_kills, 1);
        assert_eq!(blue.outer_turret_kills, 1);
        assert_eq!(blue.inhibitor_kills, 0);

        let red = team_row(&records, RED_TEAM, 600000);
        assert_eq!(red.inhibitor_kills, 1);
        assert_eq!(red.outer_turret_kills, 0);
    }

    #[test]
    fn test_elite_monsters_by_killer_team() {
        let records = timeline_records(&timeline(
            r#"[
                { "timestamp": 300000, "events": [
                    { "type": "ELITE_MONSTER_KILL", "killerTeamId": 100, "monsterType": "DRAGON", "monsterSubType": "HEXTECH_DRAGON" },
                    { "type": "ELITE_MONSTER_KILL", "killerTeamId": 200, "monsterType": "HORDE" },
                    { "type": "ELITE_MONSTER_KILL", "killerTeamId": 300, "monsterType": "BARON_NASHOR" }
                  ], "participantFrames": {} },
                { "timestamp": 360000, "events": [
                    { "type": "ELITE_MONSTER_KILL", "killerTeamId": 100, "monsterType": "DRAGON", "monsterSubType": "HEXTECH_DRAGON" }
                  ], "participantFrames": {} }
            ]"#,
        ));

        assert_eq!(records.teams.len(), 4);
        assert_eq!(team_row(&records, BLUE_TEAM, 300000).hex_dragon_kills, 1);
        assert_eq!(team_row(&records, BLUE_TEAM, 360000).hex_dragon_kills, 2);
        assert_eq!(team_row(&records, RED_TEAM, 360000).horde_kills, 1);
        assert_eq!(team_row(&records, RED_TEAM, 360000).baron_kills, 0);
        assert_eq!(team_row(&records, BLUE_TEAM, 360000).baron_kills, 0);
    }

    #[test]
    fn test_player_inherents() {
        let payload: MatchPayload = serde_json::from_str(
            r#"{
                "metadata": { "matchId": "NA1_9" },
                "info": {
                    "gameVersion": "14.5.1.1", "gameMode": "CLASSIC", "gameType": "MATCHED_GAME",
                    "queueId": 420, "gameCreation": 1, "gameDuration": 2,
                    "participants": [
                        { "puuid": "p1", "participantId": 1, "championName": "Ahri",
                          "teamId": 100, "teamPosition": "MIDDLE", "win": true },
                        { "puuid": "p6", "participantId": 6, "championName": "Zed",
                          "teamId": 200, "teamPosition": "MIDDLE", "win": false }
                    ]
                }
            }"#,
        )
        .unwrap();

        let rows = player_inherents(&payload);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].match_id, "NA1_9");
        assert_eq!(rows[1].champion_name, "Zed");
        assert!(!rows[1].win);
    }
}
