//! Wall-clock timestamps carried by status events.
//!
//! Producers may live on different threads, so events are stamped with time
//! since the Unix epoch rather than an [`Instant`](std::time::Instant) that
//! cannot be compared across clocks. All differences are computed as signed
//! seconds because producers occasionally report inverted timestamps.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Point in time at which a status event was produced.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(Duration);

impl Timestamp {
    /// The Unix epoch.
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Captures the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(Self::ZERO, Self)
    }

    /// Creates a timestamp from whole seconds since the epoch.
    #[must_use]
    pub const fn from_secs(seconds: u64) -> Self {
        Self(Duration::from_secs(seconds))
    }

    /// Creates a timestamp from milliseconds since the epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    /// Creates a timestamp from fractional seconds, clamping negative or
    /// non-finite values to the epoch.
    #[must_use]
    pub fn from_secs_f64(seconds: f64) -> Self {
        Duration::try_from_secs_f64(seconds).map_or(Self::ZERO, Self)
    }

    /// Returns the duration since the epoch.
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        self.0
    }

    /// Returns the signed number of seconds from `earlier` to `self`.
    #[must_use]
    pub fn seconds_since(self, earlier: Self) -> f64 {
        self.0.as_secs_f64() - earlier.0.as_secs_f64()
    }

    /// Returns this timestamp moved forward by `delta`.
    #[must_use]
    pub fn saturating_add(self, delta: Duration) -> Self {
        Self(self.0.saturating_add(delta))
    }
}

impl From<Duration> for Timestamp {
    fn from(since_epoch: Duration) -> Self {
        Self(since_epoch)
    }
}

/// Reports whether at least `period` has passed between `since` and `now`.
///
/// A zero period disables the gate.
pub(crate) fn period_elapsed(now: Timestamp, since: Timestamp, period: Duration) -> bool {
    period.is_zero() || now.seconds_since(since) >= period.as_secs_f64()
}

/// Reports whether strictly more than `period` has passed between `since` and
/// `now`. A zero period disables the gate.
pub(crate) fn period_exceeded(now: Timestamp, since: Timestamp, period: Duration) -> bool {
    period.is_zero() || now.seconds_since(since) > period.as_secs_f64()
}
