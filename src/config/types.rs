use crate::state::{PatchVersion, RankTier, TierBand};
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Rift-Crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub api: ApiConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of matches processed concurrently per batch
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Delay before retrying after a rate limit or unexpected failure (milliseconds)
    #[serde(rename = "batch-cooldown", default = "default_batch_cooldown")]
    pub batch_cooldown: u64,

    /// Match used to seed the frontier when no participants are known
    #[serde(rename = "seed-match-id", default = "default_seed_match_id")]
    pub seed_match_id: String,

    /// Number of known participants sampled for a warm start
    #[serde(rename = "warm-start-sample", default = "default_warm_start_sample")]
    pub warm_start_sample: usize,
}

impl CrawlerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.batch_cooldown)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_cooldown: default_batch_cooldown(),
            seed_match_id: default_seed_match_id(),
            warm_start_sample: default_warm_start_sample(),
        }
    }
}

/// Which matches are in scope
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Tracked tiers; every ranked participant must fall within them
    #[serde(rename = "tier-band", default = "default_tier_band")]
    pub tier_band: Vec<RankTier>,

    /// Accepted `major.minor` patches
    #[serde(rename = "patch-whitelist", default = "default_patch_whitelist")]
    pub patch_whitelist: Vec<String>,
}

impl FilterConfig {
    pub fn band(&self) -> TierBand {
        TierBand::new(self.tier_band.iter().copied())
    }

    /// Parsed whitelist; entries that fail to parse are skipped
    ///
    /// Validation rejects such entries before a crawl starts.
    pub fn patches(&self) -> Vec<PatchVersion> {
        self.patch_whitelist
            .iter()
            .filter_map(|p| p.parse().ok())
            .collect()
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            tier_band: default_tier_band(),
            patch_whitelist: default_patch_whitelist(),
        }
    }
}

/// Remote API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL for match endpoints (regional routing)
    #[serde(rename = "regional-url", default = "default_regional_url")]
    pub regional_url: String,

    /// Base URL for summoner and league endpoints (platform routing)
    #[serde(rename = "platform-url", default = "default_platform_url")]
    pub platform_url: String,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            regional_url: default_regional_url(),
            platform_url: default_platform_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_cooldown() -> u64 {
    10_000
}

fn default_seed_match_id() -> String {
    "NA1_4954804129".to_string()
}

fn default_warm_start_sample() -> usize {
    11
}

fn default_tier_band() -> Vec<RankTier> {
    vec![
        RankTier::Emerald,
        RankTier::Diamond,
        RankTier::Master,
        RankTier::Grandmaster,
        RankTier::Challenger,
    ]
}

fn default_patch_whitelist() -> Vec<String> {
    vec!["14.4".to_string(), "14.5".to_string(), "14.6".to_string()]
}

fn default_regional_url() -> String {
    "https://americas.api.riotgames.com".to_string()
}

fn default_platform_url() -> String {
    "https://na1.api.riotgames.com".to_string()
}

fn default_api_key_env() -> String {
    "RIOTAPI".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}
