//! Provenance ranking for total-work estimates.
//!
//! Three independent parties may claim to know how much work a job has: the
//! listing thread (running or final), the pre-scan thread, and the event
//! stream itself. Each [`Estimate`] remembers which of them backs its value
//! and only yields to a source of equal or better rank.

use std::fmt;

/// Where an object-count or total-size estimate came from.
///
/// Variants are declared best first, so the derived ordering matches the
/// rank: a smaller value is more trustworthy.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum EstimationSource {
    /// Last estimate from the listing thread; authoritative.
    ProducerFinal = 1,
    /// Pre-scan estimate.
    SeekAhead = 2,
    /// Running estimate from the listing thread.
    ProducerEstimate = 3,
    /// Accumulated from individual file or metadata events.
    IndividualMessages = 4,
}

impl EstimationSource {
    /// Numeric rank; lower is better.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Reports whether an estimate from `candidate` may replace one backed by
    /// `self`.
    #[must_use]
    pub const fn should_adopt(self, candidate: Self) -> bool {
        candidate.rank() <= self.rank()
    }

    /// Reports whether this source is at least as trustworthy as `threshold`.
    #[must_use]
    pub const fn at_least(self, threshold: Self) -> bool {
        self.rank() <= threshold.rank()
    }
}

impl fmt::Display for EstimationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ProducerFinal => "producer-final",
            Self::SeekAhead => "seek-ahead",
            Self::ProducerEstimate => "producer-estimate",
            Self::IndividualMessages => "individual-messages",
        })
    }
}

/// Reports whether an estimate from `candidate` may replace one backed by
/// `current`.
#[must_use]
pub const fn should_adopt(current: EstimationSource, candidate: EstimationSource) -> bool {
    current.should_adopt(candidate)
}

/// A value together with the source that backs it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Estimate {
    value: u64,
    source: EstimationSource,
}

impl Default for Estimate {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimate {
    /// Empty estimate backed by individual messages.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: 0,
            source: EstimationSource::IndividualMessages,
        }
    }

    /// Current value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.value
    }

    /// Source backing the current value.
    #[must_use]
    pub const fn source(self) -> EstimationSource {
        self.source
    }

    /// Replaces the value if `source` ranks at least as well as the current
    /// source. Returns whether the value was adopted.
    pub fn offer(&mut self, value: u64, source: EstimationSource) -> bool {
        if !self.source.should_adopt(source) {
            return false;
        }
        self.value = value;
        self.source = source;
        true
    }

    /// Adds `amount` while the estimate is still self-backed by individual
    /// messages. Returns whether the value changed.
    pub fn accumulate(&mut self, amount: u64) -> bool {
        if self.source != EstimationSource::IndividualMessages {
            return false;
        }
        self.value = self.value.saturating_add(amount);
        true
    }

    /// Reports whether the backing source is at least as good as `threshold`.
    #[must_use]
    pub const fn is_at_least(self, threshold: EstimationSource) -> bool {
        self.source.at_least(threshold)
    }

    /// Reports whether the value came from the final producer estimate.
    #[must_use]
    pub fn is_final(self) -> bool {
        self.source == EstimationSource::ProducerFinal
    }
}
