//! Statistics generation from the crawl database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::state::RankTier;
use crate::storage::{RunRecord, Storage, StorageResult};
use std::fmt::Write;

/// Database statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of stored matches
    pub total_matches: u64,

    /// Total number of stored participants
    pub total_participants: u64,

    /// Participants per solo-queue tier; `None` is unranked
    pub participants_by_tier: Vec<(Option<RankTier>, u64)>,

    /// Matches per patch
    pub matches_by_patch: Vec<(String, u64)>,

    /// Most recent crawl run, if any
    pub latest_run: Option<RunRecord>,
}

impl CrawlStatistics {
    /// Wall-clock length of the latest run, if it finished
    pub fn latest_run_seconds(&self) -> Option<i64> {
        let run = self.latest_run.as_ref()?;
        let started = run.started_at.parse::<chrono::DateTime<chrono::Utc>>().ok()?;
        let finished = run
            .finished_at
            .as_deref()?
            .parse::<chrono::DateTime<chrono::Utc>>()
            .ok()?;
        Some((finished - started).num_seconds())
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<CrawlStatistics> {
    Ok(CrawlStatistics {
        total_matches: storage.count_matches()?,
        total_participants: storage.count_participants()?,
        participants_by_tier: storage.count_participants_by_tier()?,
        matches_by_patch: storage.count_matches_by_patch()?,
        latest_run: storage.get_latest_run()?,
    })
}

fn percentage(count: u64, total: u64) -> f64 {
    if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Formats statistics as a plain-text report
pub fn render_statistics(stats: &CrawlStatistics) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "=== Crawl Statistics ===\n");

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Matches stored: {}", stats.total_matches);
    let _ = writeln!(out, "  Participants stored: {}", stats.total_participants);
    let _ = writeln!(out);

    if !stats.participants_by_tier.is_empty() {
        let _ = writeln!(out, "Participants by Tier:");
        for (tier, count) in &stats.participants_by_tier {
            let label = tier.map_or("UNRANKED", |t| t.to_db_string());
            let _ = writeln!(
                out,
                "  {}: {} ({:.1}%)",
                label,
                count,
                percentage(*count, stats.total_participants)
            );
        }
        let _ = writeln!(out);
    }

    if !stats.matches_by_patch.is_empty() {
        let _ = writeln!(out, "Matches by Patch:");
        for (patch, count) in &stats.matches_by_patch {
            let _ = writeln!(
                out,
                "  {}: {} ({:.1}%)",
                patch,
                count,
                percentage(*count, stats.total_matches)
            );
        }
        let _ = writeln!(out);
    }

    match &stats.latest_run {
        Some(run) => {
            let _ = writeln!(out, "Latest Run:");
            let _ = writeln!(out, "  Run {} ({})", run.id, run.status.to_db_string());
            let _ = writeln!(out, "  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                let _ = writeln!(out, "  Finished: {}", finished);
            }
            if let Some(seconds) = stats.latest_run_seconds() {
                let _ = writeln!(out, "  Duration: {}s", seconds);
            }
            let _ = writeln!(out, "  Matches ingested: {}", run.matches_ingested);
            let _ = writeln!(out, "  Config hash: {}", run.config_hash);
        }
        None => {
            let _ = writeln!(out, "No crawl runs recorded");
        }
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    print!("{}", render_statistics(stats));
}
