//! Crawler module for match discovery and ingestion
//!
//! This module contains the core crawling logic, including:
//! - Batch scheduling with rate-limit retry and cancellation
//! - Per-match fetching, validation and statistics extraction
//! - Participant resolution and match history expansion
//! - Overall crawl coordination and seeding

mod coordinator;
mod expander;
mod extract;
mod pipeline;
mod report;
mod scheduler;
mod validator;

pub use coordinator::{CrawlHandle, Crawler, SeedMode};
pub use expander::ParticipantExpander;
pub use extract::{player_inherents, timeline_records, TimelineRecords, BLUE_TEAM, RED_TEAM};
pub use pipeline::{MatchPipeline, Settlement};
pub use report::Reporter;
pub use scheduler::{BatchOutcome, BatchScheduler, BatchTally, CrawlSummary, SchedulerState};
pub use validator::{
    MatchValidator, RejectReason, ValidationOutcome, CLASSIC_MODE, MATCHED_GAME,
    RANKED_SOLO_QUEUE_ID,
};

use crate::state::Frontier;
use std::sync::{Arc, Mutex};

/// Frontier shared between the scheduler and the control surface
pub type SharedFrontier = Arc<Mutex<Frontier>>;
