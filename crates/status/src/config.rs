//! Constructor-time configuration for the aggregation controller.

use std::time::Duration;

use crate::time::Timestamp;

/// Default minimum interval between progress lines.
pub const DEFAULT_PRINT_INTERVAL: Duration = Duration::from_secs(1);
/// Default minimum interval between spinner glyph changes.
pub const DEFAULT_SPINNER_INTERVAL: Duration = Duration::from_millis(600);
/// Default minimum interval between throughput samples.
pub const DEFAULT_THROUGHPUT_INTERVAL: Duration = Duration::from_secs(5);
/// Default delay before throughput and ETA are displayed.
pub const DEFAULT_THROUGHPUT_LATENCY: Duration = Duration::from_secs(10);
/// Default console width used for padding.
pub const DEFAULT_CONSOLE_WIDTH: usize = 80;

/// Timing and layout settings shared by every aggregation strategy.
///
/// Each interval is disabled by setting it to [`Duration::ZERO`], which lets
/// tests observe every render deterministically.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusConfig {
    /// Minimum time between two progress lines.
    pub print_interval: Duration,
    /// Minimum time since the last progress line before the spinner moves.
    pub spinner_interval: Duration,
    /// Minimum time between two throughput samples.
    pub throughput_interval: Duration,
    /// Time after the job starts before throughput and ETA are shown.
    pub throughput_latency: Duration,
    /// Width each line is padded to.
    pub console_width: usize,
    /// Whether the operator asked for verbose output.
    pub verbose: bool,
    /// Fixed start time for deterministic runs.
    ///
    /// When set, aggregators use it as their start and refresh time and never
    /// re-anchor the job clock on the first transfer.
    pub fixed_time: Option<Timestamp>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            print_interval: DEFAULT_PRINT_INTERVAL,
            spinner_interval: DEFAULT_SPINNER_INTERVAL,
            throughput_interval: DEFAULT_THROUGHPUT_INTERVAL,
            throughput_latency: DEFAULT_THROUGHPUT_LATENCY,
            console_width: DEFAULT_CONSOLE_WIDTH,
            verbose: false,
            fixed_time: None,
        }
    }
}

impl StatusConfig {
    /// Creates a configuration with default intervals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum interval between progress lines.
    pub fn with_print_interval(mut self, interval: Duration) -> Self {
        self.print_interval = interval;
        self
    }

    /// Sets the minimum interval before the spinner advances.
    pub fn with_spinner_interval(mut self, interval: Duration) -> Self {
        self.spinner_interval = interval;
        self
    }

    /// Sets the minimum interval between throughput samples.
    pub fn with_throughput_interval(mut self, interval: Duration) -> Self {
        self.throughput_interval = interval;
        self
    }

    /// Sets the delay before throughput and ETA are displayed.
    pub fn with_throughput_latency(mut self, latency: Duration) -> Self {
        self.throughput_latency = latency;
        self
    }

    /// Sets the console width used for padding.
    pub fn with_console_width(mut self, width: usize) -> Self {
        self.console_width = width;
        self
    }

    /// Enables or disables verbose diagnostics.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Pins the start time for deterministic output.
    pub fn with_fixed_time(mut self, time: Timestamp) -> Self {
        self.fixed_time = Some(time);
        self
    }

    /// Configuration with every rate limit disabled.
    ///
    /// Every event produces a progress line and throughput is sampled on every
    /// event, which is what most tests want.
    #[must_use]
    pub fn unthrottled() -> Self {
        Self {
            print_interval: Duration::ZERO,
            spinner_interval: Duration::ZERO,
            throughput_interval: Duration::ZERO,
            throughput_latency: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Returns the current time, or the fixed time when one is configured.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.fixed_time.unwrap_or_else(Timestamp::now)
    }

    /// Reports whether a fixed clock was injected.
    #[must_use]
    pub const fn has_fixed_time(&self) -> bool {
        self.fixed_time.is_some()
    }
}
