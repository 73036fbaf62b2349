//! Two-component game patch versions
//!
//! Matches report a full build string such as `14.5.562.3921`; filtering
//! only cares about the `major.minor` prefix.

use std::fmt;
use std::str::FromStr;

/// A `major.minor` patch version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatchVersion {
    pub major: u32,
    pub minor: u32,
}

impl PatchVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Derives the patch from a full game version string
    ///
    /// Returns None when the string does not start with two numeric
    /// components.
    pub fn from_game_version(version: &str) -> Option<Self> {
        let mut parts = version.trim().split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        Some(Self { major, minor })
    }
}

impl FromStr for PatchVersion {
    type Err = String;

    /// Parses exactly `major.minor`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split('.').collect::<Vec<_>>().as_slice() {
            [major, minor] => {
                let major = major
                    .parse()
                    .map_err(|_| format!("invalid major version in '{}'", s))?;
                let minor = minor
                    .parse()
                    .map_err(|_| format!("invalid minor version in '{}'", s))?;
                Ok(Self { major, minor })
            }
            _ => Err(format!("expected 'major.minor', got '{}'", s)),
        }
    }
}

impl fmt::Display for PatchVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
