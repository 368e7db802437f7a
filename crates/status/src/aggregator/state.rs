//! State shared by every aggregation strategy.

use std::time::Duration;

use crate::config::StatusConfig;
use crate::estimation::{Estimate, EstimationSource};
use crate::event::{ProducerEstimate, SeekAheadEstimate};
use crate::time::{Timestamp, period_elapsed, period_exceeded};

/// Glyphs cycled by the spinner.
pub const SPINNER_GLYPHS: [char; 4] = ['/', '-', '\\', '|'];

/// Totals, clocks and gating flags common to both aggregators.
#[derive(Clone, Debug)]
pub struct AggregatorState {
    print_interval: Duration,
    spinner_interval: Duration,
    throughput_interval: Duration,
    throughput_latency: Duration,
    console_width: usize,

    pub(crate) num_objects: Estimate,
    pub(crate) total_size: Estimate,
    pub(crate) objects_finished: u64,

    spinner_index: usize,

    pub(crate) refresh_time: Timestamp,
    pub(crate) start_time: Timestamp,
    pub(crate) last_throughput_time: Timestamp,
    pub(crate) throughput: f64,

    /// Set when an object completes so the next gate check prints regardless
    /// of the print interval.
    pub(crate) force_print: bool,
    /// Set once the finished count reaches the final producer total.
    pub(crate) final_message: bool,
}

impl AggregatorState {
    /// Creates state whose clocks start at `config.now()`.
    #[must_use]
    pub fn new(config: &StatusConfig) -> Self {
        let now = config.now();
        Self {
            print_interval: config.print_interval,
            spinner_interval: config.spinner_interval,
            throughput_interval: config.throughput_interval,
            throughput_latency: config.throughput_latency,
            console_width: config.console_width,
            num_objects: Estimate::new(),
            total_size: Estimate::new(),
            objects_finished: 0,
            spinner_index: 0,
            refresh_time: now,
            start_time: now,
            last_throughput_time: now,
            throughput: 0.0,
            force_print: false,
            final_message: false,
        }
    }

    /// Object-count estimate.
    #[must_use]
    pub const fn num_objects(&self) -> Estimate {
        self.num_objects
    }

    /// Total-size estimate.
    #[must_use]
    pub const fn total_size(&self) -> Estimate {
        self.total_size
    }

    /// Objects finished so far.
    #[must_use]
    pub const fn objects_finished(&self) -> u64 {
        self.objects_finished
    }

    /// Most recent throughput sample.
    #[must_use]
    pub const fn throughput(&self) -> f64 {
        self.throughput
    }

    /// Time of the last progress line.
    #[must_use]
    pub const fn refresh_time(&self) -> Timestamp {
        self.refresh_time
    }

    /// Job start time.
    #[must_use]
    pub const fn start_time(&self) -> Timestamp {
        self.start_time
    }

    /// Index of the glyph the spinner will show next.
    #[must_use]
    pub const fn spinner_index(&self) -> usize {
        self.spinner_index
    }

    /// Reports whether the next progress line is the final one.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        self.final_message
    }

    /// Clears the per-event force-print flag before an event is handled.
    pub(crate) fn begin_event(&mut self) {
        self.force_print = false;
    }

    /// Re-anchors every clock to `now`.
    pub(crate) fn restart_clocks(&mut self, now: Timestamp) {
        self.refresh_time = now;
        self.start_time = now;
        self.last_throughput_time = now;
    }

    /// Marks the final line once the finished count meets a final total.
    pub(crate) fn check_final(&mut self) {
        if self.num_objects.is_final() && self.objects_finished == self.num_objects.value() {
            self.final_message = true;
        }
    }

    /// Forces the next line to be the final one.
    pub(crate) fn force_final(&mut self) {
        self.final_message = true;
    }

    /// Applies a listing-thread estimate to both totals.
    pub(crate) fn apply_producer_estimate(&mut self, estimate: &ProducerEstimate) {
        let source = if estimate.is_final {
            EstimationSource::ProducerFinal
        } else {
            EstimationSource::ProducerEstimate
        };
        self.apply_estimate(source, estimate.num_objects, estimate.total_size);
    }

    /// Applies a pre-scan estimate to both totals.
    pub(crate) fn apply_seek_ahead(&mut self, estimate: &SeekAheadEstimate) {
        self.apply_estimate(
            EstimationSource::SeekAhead,
            estimate.num_objects,
            estimate.total_size,
        );
    }

    fn apply_estimate(&mut self, source: EstimationSource, objects: u64, size: Option<u64>) {
        if self.num_objects.offer(objects, source) {
            logging::trace_estimate!("object count {} adopted from {}", objects, source);
        }
        // A missing or zero size must not claim the size source.
        if let Some(size) = size.filter(|size| *size > 0)
            && self.total_size.offer(size, source)
        {
            logging::trace_estimate!("total size {} adopted from {}", size, source);
        }
    }

    /// Print gate: the print interval has elapsed or an object completed.
    #[must_use]
    pub fn should_print_progress(&self, now: Timestamp) -> bool {
        self.force_print || period_elapsed(now, self.refresh_time, self.print_interval)
    }

    /// Spinner gate: the spinner interval has passed since the last line and
    /// some total size is known.
    #[must_use]
    pub fn should_print_spinner(&self, now: Timestamp) -> bool {
        self.total_size.value() > 0
            && period_exceeded(now, self.refresh_time, self.spinner_interval)
    }

    /// Returns the current glyph and moves to the next one.
    pub fn advance_spinner(&mut self) -> char {
        let glyph = SPINNER_GLYPHS[self.spinner_index];
        self.spinner_index = (self.spinner_index + 1) % SPINNER_GLYPHS.len();
        glyph
    }

    /// Records that a progress line was written at `now`.
    pub(crate) fn mark_refreshed(&mut self, now: Timestamp) {
        self.refresh_time = now;
    }

    /// Reports whether a throughput sample is due at `now`.
    pub(crate) fn throughput_due(&self, now: Timestamp) -> bool {
        period_elapsed(now, self.last_throughput_time, self.throughput_interval)
    }

    /// Samples throughput as `delta` units over the time between the previous
    /// sample and `last_activity`.
    ///
    /// Returns `false` and leaves the sample untouched when that interval is
    /// zero or negative; the caller then keeps its baseline for the next
    /// cycle.
    pub(crate) fn sample_throughput(
        &mut self,
        delta: f64,
        last_activity: Timestamp,
        now: Timestamp,
    ) -> bool {
        let elapsed = last_activity.seconds_since(self.last_throughput_time);
        if elapsed <= 0.0 || !elapsed.is_finite() {
            return false;
        }
        // Clamp so cancellation never shows up as a negative rate.
        self.throughput = (delta / elapsed).max(0.0);
        self.last_throughput_time = now;
        logging::trace_throughput!("sampled {:.2} units/s over {:.3}s", self.throughput, elapsed);
        true
    }

    /// Reports whether throughput may be shown yet.
    pub(crate) fn throughput_visible(&self) -> bool {
        period_exceeded(self.refresh_time, self.start_time, self.throughput_latency)
    }

    /// Pads `body` to the console width and appends the line terminator.
    ///
    /// The final line ends in `\n` and is one column shorter so the cursor
    /// never wraps; every other line ends in `\r` to be overwritten.
    #[must_use]
    pub fn terminate_line(&self, body: &str) -> String {
        let used = body.chars().count();
        let (width, terminator) = if self.final_message {
            (self.console_width.saturating_sub(1), '\n')
        } else {
            (self.console_width, '\r')
        };
        let padding = width.saturating_sub(used);

        let mut line = String::with_capacity(body.len() + padding + 1);
        line.push_str(body);
        line.extend(std::iter::repeat_n(' ', padding));
        line.push(terminator);
        line
    }
}
