//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the remote match, summoner and
//! league APIs and run the full crawl cycle end-to-end.

use rift_crawler::config::{ApiConfig, Config, CrawlerConfig, FilterConfig, OutputConfig};
use rift_crawler::notify::ChannelNotifier;
use rift_crawler::riot::{GatewayError, RiotApi, RiotClient, API_KEY_HEADER};
use rift_crawler::storage::{self, RunStatus, SqliteStorage};
use rift_crawler::{Crawler, RankTier};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "RGAPI-test";

fn api_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        regional_url: base_url.to_string(),
        platform_url: base_url.to_string(),
        api_key_env: "RIFT_CRAWLER_TEST_KEY".to_string(),
        timeout_secs: 5,
    }
}

/// Creates a test configuration pointing both hosts at the mock server
fn create_test_config(base_url: &str, db_path: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            batch_size: 5,
            batch_cooldown: 10,
            seed_match_id: "NA1_1".to_string(),
            warm_start_sample: 11,
        },
        filter: FilterConfig::default(),
        api: api_config(base_url),
        output: OutputConfig {
            database_path: db_path.display().to_string(),
        },
    }
}

fn match_json(id: &str, version: &str, puuids: &[&str]) -> Value {
    let participants: Vec<Value> = puuids
        .iter()
        .enumerate()
        .map(|(i, puuid)| {
            json!({
                "puuid": puuid,
                "participantId": i + 1,
                "championName": "Ahri",
                "teamId": if i < 5 { 100 } else { 200 },
                "teamPosition": "MIDDLE",
                "win": i < 5,
            })
        })
        .collect();

    json!({
        "metadata": { "matchId": id, "participants": puuids },
        "info": {
            "gameVersion": version,
            "gameMode": "CLASSIC",
            "gameType": "MATCHED_GAME",
            "queueId": 420,
            "gameCreation": 1709000000000i64,
            "gameDuration": 1850,
            "participants": participants,
        }
    })
}

fn timeline_json(id: &str) -> Value {
    json!({
        "metadata": { "matchId": id },
        "info": {
            "participants": [
                { "participantId": 1, "puuid": "p1" },
                { "participantId": 2, "puuid": "p2" }
            ],
            "frames": [{
                "timestamp": 60000,
                "participantFrames": {
                    "1": { "participantId": 1, "totalGold": 500, "level": 2 },
                    "2": { "participantId": 2, "totalGold": 450, "level": 1 }
                },
                "events": [
                    { "type": "CHAMPION_KILL", "killerId": 1, "victimId": 2,
                      "assistingParticipantIds": [], "timestamp": 55000 },
                    { "type": "BUILDING_KILL", "teamId": 200, "buildingType": "TOWER_BUILDING",
                      "towerType": "OUTER_TURRET", "timestamp": 58000 },
                    { "type": "LEVEL_UP", "participantId": 1, "level": 2 }
                ]
            }]
        }
    })
}

async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_player(server: &MockServer, puuid: &str, tier: &str, history: &[&str]) {
    let summoner_id = format!("summ-{}", puuid);
    mount_json(
        server,
        &format!("/lol/summoner/v4/summoners/by-puuid/{}", puuid),
        json!({
            "puuid": puuid,
            "id": summoner_id,
            "accountId": format!("acct-{}", puuid),
            "name": format!("Player {}", puuid),
            "summonerLevel": 300
        }),
    )
    .await;
    mount_json(
        server,
        &format!("/lol/league/v4/entries/by-summoner/{}", summoner_id),
        json!([
            { "queueType": "RANKED_FLEX_SR", "tier": "GOLD", "rank": "I" },
            { "queueType": "RANKED_SOLO_5x5", "tier": tier, "rank": "II" }
        ]),
    )
    .await;
    mount_json(
        server,
        &format!("/lol/match/v5/matches/by-puuid/{}/ids", puuid),
        json!(history),
    )
    .await;
}

fn test_client(server: &MockServer) -> RiotClient {
    RiotClient::new(&api_config(&server.uri()), API_KEY).expect("Failed to build client")
}

#[tokio::test]
async fn test_status_classification() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_429"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "5"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_500"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_BAD"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);

    assert_eq!(
        client.get_match("NA1_404").await.unwrap_err(),
        GatewayError::NotFound
    );
    assert_eq!(
        client.get_match("NA1_429").await.unwrap_err(),
        GatewayError::RateLimited
    );
    assert!(matches!(
        client.get_match("NA1_500").await,
        Err(GatewayError::Unknown(_))
    ));
    assert!(matches!(
        client.get_match("NA1_BAD").await,
        Err(GatewayError::Unknown(_))
    ));
}

#[tokio::test]
async fn test_requests_carry_api_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lol/summoner/v4/summoners/by-puuid/p1"))
        .and(header(API_KEY_HEADER, API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "puuid": "p1",
            "id": "summ-p1",
            "accountId": "acct-p1",
            "name": "Player p1",
            "summonerLevel": 300
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let profile = test_client(&mock_server)
        .get_profile("p1")
        .await
        .expect("Profile lookup failed");

    assert_eq!(profile.id, "summ-p1");
}

#[tokio::test]
async fn test_rank_entries_pick_solo_queue() {
    let mock_server = MockServer::start().await;
    mount_player(&mock_server, "p1", "EMERALD", &[]).await;

    let entries = test_client(&mock_server)
        .get_rank_entries("summ-p1")
        .await
        .expect("Rank lookup failed");

    assert_eq!(
        rift_crawler::riot::solo_queue_tier(&entries),
        Some(RankTier::Emerald)
    );
}

#[tokio::test]
async fn test_full_crawl_from_seed() {
    let mock_server = MockServer::start().await;

    mount_json(
        &mock_server,
        "/lol/match/v5/matches/NA1_1",
        match_json("NA1_1", "14.5.562.3921", &["p1", "p2"]),
    )
    .await;
    mount_json(
        &mock_server,
        "/lol/match/v5/matches/NA1_1/timeline",
        timeline_json("NA1_1"),
    )
    .await;
    // Old patch, rejected before any participant lookup
    mount_json(
        &mock_server,
        "/lol/match/v5/matches/NA1_2",
        match_json("NA1_2", "14.3.100.1", &["p1", "p2"]),
    )
    .await;
    mount_player(&mock_server, "p1", "DIAMOND", &["NA1_1", "NA1_2"]).await;
    mount_player(&mock_server, "p2", "MASTER", &["NA1_2", "NA1_3"]).await;
    // NA1_3 is not mounted and comes back 404

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("crawl.db");
    let config = create_test_config(&mock_server.uri(), &db_path);

    let storage = storage::shared(SqliteStorage::new(&db_path).expect("Failed to open storage"));
    let notifier = Arc::new(ChannelNotifier::default());
    let mut feed = notifier.subscribe();

    let crawler = Crawler::new(
        &config,
        "integration-hash",
        Arc::new(test_client(&mock_server)),
        storage.clone(),
        notifier.clone(),
    )
    .expect("Failed to create crawler");

    let summary = crawler
        .crawl()
        .await
        .expect("Crawl failed")
        .expect("Crawl was already running");

    assert_eq!(summary.ingested, 1);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.missing, 1);
    assert_eq!(summary.batches, 2);
    assert!(!summary.cancelled);
    assert_eq!(crawler.finished_count().unwrap(), 3);

    {
        let storage = storage::lock(&storage).unwrap();
        assert_eq!(storage.count_matches().unwrap(), 1);
        assert_eq!(storage.count_participants().unwrap(), 2);

        let stored = storage.get_match("NA1_1").unwrap().expect("Match not stored");
        assert_eq!(stored.patch, "14.5");
        assert_eq!(stored.ranks, vec![RankTier::Diamond, RankTier::Master]);

        let run = storage.get_latest_run().unwrap().expect("Run not recorded");
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.matches_ingested, 1);
        assert_eq!(run.config_hash, "integration-hash");
    }

    // Timeline rows land in their own tables
    let conn = rusqlite::Connection::open(&db_path).expect("Failed to reopen database");
    let team_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM team_timestamps", [], |row| row.get(0))
        .unwrap();
    let player_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM player_timestamps", [], |row| row.get(0))
        .unwrap();
    let blue_outer: i64 = conn
        .query_row(
            "SELECT outer_turret_kills FROM team_timestamps WHERE team_id = 100",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(team_rows, 2);
    assert_eq!(player_rows, 2);
    assert_eq!(blue_outer, 1);

    let mut messages = Vec::new();
    while let Ok(message) = feed.try_recv() {
        messages.push(message);
    }
    assert!(messages.iter().any(|m| m.contains("Cold start from seed match NA1_1")));
    assert!(messages.iter().any(|m| m.contains("Ingested match NA1_1")));
    assert!(messages.iter().any(|m| m.contains("Rejected match NA1_2")));
}

#[tokio::test]
async fn test_second_session_skips_stored_matches() {
    let mock_server = MockServer::start().await;

    mount_json(
        &mock_server,
        "/lol/match/v5/matches/NA1_1",
        match_json("NA1_1", "14.5.562.3921", &["p1"]),
    )
    .await;
    mount_json(
        &mock_server,
        "/lol/match/v5/matches/NA1_1/timeline",
        timeline_json("NA1_1"),
    )
    .await;
    mount_player(&mock_server, "p1", "DIAMOND", &["NA1_1"]).await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("crawl.db");
    let config = create_test_config(&mock_server.uri(), &db_path);

    let first = Crawler::new(
        &config,
        "hash",
        Arc::new(test_client(&mock_server)),
        storage::shared(SqliteStorage::new(&db_path).unwrap()),
        Arc::new(ChannelNotifier::default()),
    )
    .unwrap();
    first.crawl().await.unwrap();
    drop(first);

    // Warm start: the only known participant leads back to a stored match
    let second = Crawler::new(
        &config,
        "hash",
        Arc::new(test_client(&mock_server)),
        storage::shared(SqliteStorage::new(&db_path).unwrap()),
        Arc::new(ChannelNotifier::default()),
    )
    .unwrap();
    assert_eq!(second.finished_count().unwrap(), 1);

    let summary = second.crawl().await.unwrap().unwrap();
    assert_eq!(summary.batches, 0);
    assert_eq!(summary.ingested, 0);
}
