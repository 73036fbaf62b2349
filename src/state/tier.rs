//! Rank tier definitions for participant and match filtering
//!
//! This module defines the competitive ladder tiers and the tracked band of
//! tiers the crawler ingests.
use serde::Deserialize;
use std::fmt;

/// A competitive ranked tier, ordered from lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RankTier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Emerald,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl RankTier {
    /// Converts the tier to the label used by the remote API and the database
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Iron => "IRON",
            Self::Bronze => "BRONZE",
            Self::Silver => "SILVER",
            Self::Gold => "GOLD",
            Self::Platinum => "PLATINUM",
            Self::Emerald => "EMERALD",
            Self::Diamond => "DIAMOND",
            Self::Master => "MASTER",
            Self::Grandmaster => "GRANDMASTER",
            Self::Challenger => "CHALLENGER",
        }
    }

    /// Parses a tier label
    ///
    /// Returns None if the string doesn't match any known tier.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "IRON" => Some(Self::Iron),
            "BRONZE" => Some(Self::Bronze),
            "SILVER" => Some(Self::Silver),
            "GOLD" => Some(Self::Gold),
            "PLATINUM" => Some(Self::Platinum),
            "EMERALD" => Some(Self::Emerald),
            "DIAMOND" => Some(Self::Diamond),
            "MASTER" => Some(Self::Master),
            "GRANDMASTER" => Some(Self::Grandmaster),
            "CHALLENGER" => Some(Self::Challenger),
            _ => None,
        }
    }

    /// Returns all tiers in ladder order
    pub fn all_tiers() -> Vec<Self> {
        vec![
            Self::Iron,
            Self::Bronze,
            Self::Silver,
            Self::Gold,
            Self::Platinum,
            Self::Emerald,
            Self::Diamond,
            Self::Master,
            Self::Grandmaster,
            Self::Challenger,
        ]
    }
}

impl fmt::Display for RankTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// The set of tiers a match or participant must fall within to be tracked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierBand {
    tiers: Vec<RankTier>,
}

impl TierBand {
    /// Creates a band from the given tiers, sorted and deduplicated
    pub fn new(tiers: impl IntoIterator<Item = RankTier>) -> Self {
        let mut tiers: Vec<RankTier> = tiers.into_iter().collect();
        tiers.sort();
        tiers.dedup();
        Self { tiers }
    }

    /// Returns true if the tier is tracked
    pub fn contains(&self, tier: RankTier) -> bool {
        self.tiers.binary_search(&tier).is_ok()
    }

    /// Returns true if the band has no gaps on the ladder
    pub fn is_contiguous(&self) -> bool {
        let ladder = RankTier::all_tiers();
        let positions: Vec<usize> = self
            .tiers
            .iter()
            .filter_map(|t| ladder.iter().position(|l| l == t))
            .collect();

        positions.windows(2).all(|w| w[1] == w[0] + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Lowest tracked tier
    pub fn floor(&self) -> Option<RankTier> {
        self.tiers.first().copied()
    }

    pub fn tiers(&self) -> &[RankTier] {
        &self.tiers
    }
}

impl fmt::Display for TierBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.tiers.first(), self.tiers.last()) {
            (Some(low), Some(high)) if low == high => write!(f, "{}", low),
            (Some(low), Some(high)) => write!(f, "{}..{}", low, high),
            _ => write!(f, "(empty)"),
        }
    }
}
