//! State module for tracking crawl progress
//!
//! This module provides the in-memory working set of the crawler and the
//! small value types used to decide what gets crawled.
//!
//! # Components
//!
//! - `Frontier`: queue of discovered match ids plus in-flight and finished sets
//! - `RankTier` / `TierBand`: competitive tiers and the tracked band
//! - `PatchVersion`: `major.minor` game patch

mod frontier;
mod patch;
mod tier;

// Re-export main types
pub use frontier::Frontier;
pub use patch::PatchVersion;
pub use tier::{RankTier, TierBand};
