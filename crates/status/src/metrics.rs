//! Counters for retryable errors diverted away from rendering.

use rustc_hash::FxHashMap;

/// Receives retryable errors reported by workers.
pub trait ErrorMetrics {
    /// Records one retryable error of `error_type`.
    fn record_retryable_error(&mut self, error_type: &str);
}

impl<F> ErrorMetrics for F
where
    F: FnMut(&str),
{
    fn record_retryable_error(&mut self, error_type: &str) {
        self(error_type);
    }
}

/// Retryable error counts keyed by error type.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RetryableErrorCounts {
    counts: FxHashMap<String, u64>,
}

impl RetryableErrorCounts {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of errors recorded for `error_type`.
    #[must_use]
    pub fn count(&self, error_type: &str) -> u64 {
        self.counts.get(error_type).copied().unwrap_or(0)
    }

    /// Number of errors recorded across all types.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Reports whether no error has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Error types and their counts, sorted by type for stable output.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<_> = self
            .counts
            .iter()
            .map(|(error_type, count)| (error_type.as_str(), *count))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl ErrorMetrics for RetryableErrorCounts {
    fn record_retryable_error(&mut self, error_type: &str) {
        if let Some(count) = self.counts.get_mut(error_type) {
            *count = count.saturating_add(1);
        } else {
            self.counts.insert(error_type.to_owned(), 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_type() {
        let mut counts = RetryableErrorCounts::new();
        assert!(counts.is_empty());

        counts.record_retryable_error("ConnectionReset");
        counts.record_retryable_error("Timeout");
        counts.record_retryable_error("ConnectionReset");

        assert_eq!(counts.count("ConnectionReset"), 2);
        assert_eq!(counts.count("Timeout"), 1);
        assert_eq!(counts.count("Unknown"), 0);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.sorted(), vec![("ConnectionReset", 2), ("Timeout", 1)]);
    }

    #[test]
    fn closures_act_as_collectors() {
        let mut seen = Vec::new();
        {
            let mut collector = |error_type: &str| seen.push(error_type.to_owned());
            collector.record_retryable_error("Throttled");
        }
        assert_eq!(seen, vec!["Throttled".to_owned()]);
    }
}
