//! Output module for crawl statistics
//!
//! This module handles summarizing the crawl database for the `--stats`
//! report.

pub mod stats;

pub use stats::{load_statistics, print_statistics, render_statistics, CrawlStatistics};
