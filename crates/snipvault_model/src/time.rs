//! Timestamps for last-writer-wins comparison.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A point in time, in unix milliseconds.
///
/// Timestamps provide the total order used by the merge resolver: for any
/// matched local/remote pair the later `updated_at` wins, and an exact tie
/// keeps the local payload.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a timestamp from unix milliseconds.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the raw millisecond value.
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX));
        Self(millis)
    }

    /// Returns this timestamp advanced by the given number of milliseconds.
    #[must_use]
    pub const fn plus_millis(self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        let t = Timestamp::from_millis(1_000);
        assert!(t < t.plus_millis(1));
        assert_eq!(t, Timestamp::from_millis(1_000));
    }

    #[test]
    fn now_is_positive() {
        assert!(Timestamp::now().as_millis() > 0);
    }

    #[test]
    fn plus_millis_saturates() {
        let t = Timestamp::from_millis(i64::MAX);
        assert_eq!(t.plus_millis(10), t);
    }
}
