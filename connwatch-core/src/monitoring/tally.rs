//! Per-tick connection tally

use std::fmt;

/// Result of one counting pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tally {
    /// Number of matching connections
    Count(u64),
    /// The listing command failed this tick
    Unavailable,
}

impl Tally {
    /// Value written to the sample line; `Unavailable` is `-1`
    #[must_use]
    pub fn sample_value(self) -> i64 {
        match self {
            Self::Count(n) => i64::try_from(n).unwrap_or(i64::MAX),
            Self::Unavailable => -1,
        }
    }

    /// Returns the count, or `None` when unavailable
    #[must_use]
    pub const fn count(self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(n),
            Self::Unavailable => None,
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Unavailable => f.write_str("unavailable"),
        }
    }
}
