//! HTTP client for the remote match, summoner and league APIs
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the API key header
//! - Routing each endpoint to its regional or platform host
//! - Classifying responses into not-found, rate-limited and unknown failures

use crate::config::ApiConfig;
use crate::riot::traits::{GatewayError, GatewayResult, RiotApi};
use crate::riot::types::{MatchPayload, RankEntry, SummonerProfile, TimelinePayload};
use crate::{ConfigError, CrawlError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-Riot-Token";

/// Builds an HTTP client with the API key attached to every request
///
/// # Arguments
///
/// * `config` - The API configuration
/// * `api_key` - The API key sent in the `X-Riot-Token` header
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(CrawlError)` - The key is not a valid header value or the client failed to build
pub fn build_http_client(config: &ApiConfig, api_key: &str) -> Result<Client, CrawlError> {
    let mut key = HeaderValue::from_str(api_key).map_err(|_| {
        ConfigError::Validation("API key contains characters not allowed in a header".to_string())
    })?;
    key.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(API_KEY_HEADER, key);

    let client = Client::builder()
        .user_agent(concat!("rift-crawler/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Maps an HTTP status to a gateway failure
///
/// | Status | Result |
/// |--------|--------|
/// | 2xx | None (success) |
/// | 404 | NotFound |
/// | 429 | RateLimited |
/// | anything else | Unknown |
pub fn classify_status(status: StatusCode) -> Option<GatewayError> {
    if status.is_success() {
        None
    } else if status == StatusCode::NOT_FOUND {
        Some(GatewayError::NotFound)
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        Some(GatewayError::RateLimited)
    } else {
        Some(GatewayError::Unknown(format!("HTTP {}", status.as_u16())))
    }
}

/// Remote API client backed by reqwest
#[derive(Debug, Clone)]
pub struct RiotClient {
    client: Client,
    regional: Url,
    platform: Url,
}

impl RiotClient {
    /// Creates a client from configuration and an API key
    pub fn new(config: &ApiConfig, api_key: &str) -> Result<Self, CrawlError> {
        let client = build_http_client(config, api_key)?;
        Self::with_client(client, config)
    }

    /// Creates a client reading the API key from the configured environment variable
    pub fn from_env(config: &ApiConfig) -> Result<Self, CrawlError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| ConfigError::MissingEnv(config.api_key_env.clone()))?;
        Self::new(config, &api_key)
    }

    /// Creates a client around an existing reqwest client
    pub fn with_client(client: Client, config: &ApiConfig) -> Result<Self, CrawlError> {
        let regional = Url::parse(&config.regional_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("regional_url: {}", e)))?;
        let platform = Url::parse(&config.platform_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("platform_url: {}", e)))?;

        Ok(Self {
            client,
            regional,
            platform,
        })
    }

    /// Appends percent-encoded path segments to a base URL
    ///
    /// Ids are never spliced into the URL as raw text, so an id can't
    /// change the host, path or query.
    fn route(base: &Url, segments: &[&str]) -> GatewayResult<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Unknown(format!("Cannot route from base URL {}", base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a GET request and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> GatewayResult<T> {
        tracing::debug!("GET {}", url.path());

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Unknown(format!("Request timeout for {}", url.path()))
            } else if e.is_connect() {
                GatewayError::Unknown(format!("Connection refused for {}", url.path()))
            } else {
                GatewayError::Unknown(format!("Request to {} failed: {}", url.path(), e))
            }
        })?;

        if let Some(err) = classify_status(response.status()) {
            if err == GatewayError::RateLimited {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unspecified");
                tracing::debug!("Rate limited on {} (retry-after: {})", url.path(), retry_after);
            }
            return Err(err);
        }

        response.json::<T>().await.map_err(|e| {
            GatewayError::Unknown(format!("Malformed payload from {}: {}", url.path(), e))
        })
    }
}

#[async_trait]
impl RiotApi for RiotClient {
    async fn list_match_ids(&self, puuid: &str) -> GatewayResult<Vec<String>> {
        let url = Self::route(
            &self.regional,
            &["lol", "match", "v5", "matches", "by-puuid", puuid, "ids"],
        )?;
        self.get_json(url).await
    }

    async fn get_match(&self, match_id: &str) -> GatewayResult<MatchPayload> {
        let url = Self::route(&self.regional, &["lol", "match", "v5", "matches", match_id])?;
        self.get_json(url).await
    }

    async fn get_timeline(&self, match_id: &str) -> GatewayResult<TimelinePayload> {
        let url = Self::route(
            &self.regional,
            &["lol", "match", "v5", "matches", match_id, "timeline"],
        )?;
        self.get_json(url).await
    }

    async fn get_profile(&self, puuid: &str) -> GatewayResult<SummonerProfile> {
        let url = Self::route(
            &self.platform,
            &["lol", "summoner", "v4", "summoners", "by-puuid", puuid],
        )?;
        self.get_json(url).await
    }

    async fn get_rank_entries(&self, summoner_id: &str) -> GatewayResult<Vec<RankEntry>> {
        let url = Self::route(
            &self.platform,
            &["lol", "league", "v4", "entries", "by-summoner", summoner_id],
        )?;
        self.get_json(url).await
    }
}
