//! Strategy selection and print gating.
//!
//! The controller owns the active [`Aggregator`] and decides which strategy
//! describes the job from the first decisive event it sees:
//!
//! | Phase            | Event                         | Result                          |
//! |------------------|-------------------------------|---------------------------------|
//! | `NoStrategy`     | estimate                      | buffered                        |
//! | `NoStrategy`     | metadata completion           | `MetadataActive`, replay buffer |
//! | `NoStrategy`     | file or progress              | `DataActive`, replay buffer     |
//! | `NoStrategy`     | end of work                   | `DataActive`, replay buffer     |
//! | `MetadataActive` | file or progress              | `DataActive`, replay buffer     |
//! | `DataActive`     | anything                      | never reverts                   |
//!
//! Retryable errors never reach an aggregator; they go to the
//! [`ErrorMetrics`] collector. Every other accepted event is handled, then
//! throughput is resampled and the print and spinner gates are checked.

use std::collections::VecDeque;
use std::io::Write;

use crate::aggregator::{
    Aggregator, DataAggregator, MetadataAggregator, ProgressSnapshot, Strategy,
};
use crate::config::StatusConfig;
use crate::error::StatusError;
use crate::event::{RetryableError, SeekAheadEstimate, StatusEvent};
use crate::format::human_readable;
use crate::metrics::{ErrorMetrics, RetryableErrorCounts};
use crate::time::Timestamp;

/// Maximum number of estimates held for replay into a new strategy.
pub const MAX_BUFFERED_ESTIMATES: usize = 1024;

/// Which strategy the controller has settled on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ControllerPhase {
    /// No decisive event seen yet; estimates are buffered.
    NoStrategy,
    /// Metadata-only job; may still be replaced by a data strategy.
    MetadataActive,
    /// Data-moving job; final.
    DataActive,
}

/// Routes status events to the active aggregation strategy and writes
/// progress lines to `W`.
///
/// The controller is single-threaded. Concurrent producers reach it through
/// a [`queue`](crate::queue) adapter.
///
/// # Example
///
/// ```
/// use status::{ControllerPhase, StatusConfig, StatusController, StatusEvent, Timestamp};
///
/// let config = StatusConfig::unthrottled().with_fixed_time(Timestamp::ZERO);
/// let mut controller = StatusController::new(config, Vec::new());
///
/// controller.call(Some(StatusEvent::metadata_done(Timestamp::from_secs(1))))?;
/// assert_eq!(controller.phase(), ControllerPhase::MetadataActive);
///
/// controller.call(Some(StatusEvent::NoMoreWork))?;
/// assert!(controller.is_finished());
/// # Ok::<(), status::StatusError>(())
/// ```
pub struct StatusController<W, M = RetryableErrorCounts> {
    config: StatusConfig,
    aggregator: Option<Box<dyn Aggregator>>,
    early_estimates: VecDeque<StatusEvent>,
    output: W,
    metrics: M,
    announced_seek_ahead: bool,
    final_printed: bool,
}

impl<W: Write> StatusController<W> {
    /// Creates a controller that counts retryable errors by type.
    pub fn new(config: StatusConfig, output: W) -> Self {
        Self::with_metrics(config, output, RetryableErrorCounts::new())
    }
}

impl<W: Write, M: ErrorMetrics> StatusController<W, M> {
    /// Creates a controller that reports retryable errors to `metrics`.
    pub fn with_metrics(config: StatusConfig, output: W, metrics: M) -> Self {
        Self {
            config,
            aggregator: None,
            early_estimates: VecDeque::new(),
            output,
            metrics,
            announced_seek_ahead: false,
            final_printed: false,
        }
    }

    /// Current strategy phase.
    #[must_use]
    pub fn phase(&self) -> ControllerPhase {
        match self.aggregator.as_deref().map(Aggregator::strategy) {
            None => ControllerPhase::NoStrategy,
            Some(Strategy::Metadata) => ControllerPhase::MetadataActive,
            Some(Strategy::Data) => ControllerPhase::DataActive,
        }
    }

    /// Counters of the active strategy, if one has been chosen.
    #[must_use]
    pub fn snapshot(&self) -> Option<ProgressSnapshot> {
        self.aggregator.as_deref().map(Aggregator::snapshot)
    }

    /// Configuration the controller was built with.
    #[must_use]
    pub const fn config(&self) -> &StatusConfig {
        &self.config
    }

    /// Output stream.
    #[must_use]
    pub const fn output(&self) -> &W {
        &self.output
    }

    /// Retryable error collector.
    #[must_use]
    pub const fn metrics(&self) -> &M {
        &self.metrics
    }

    /// Number of estimates held for replay.
    #[must_use]
    pub fn buffered_estimates(&self) -> usize {
        self.early_estimates.len()
    }

    /// Reports whether the final line has been written.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.final_printed
    }

    /// Consumes the controller, returning the output stream and collector.
    pub fn into_parts(self) -> (W, M) {
        (self.output, self.metrics)
    }

    /// Handles one event, using the event's own timestamp as the current time.
    ///
    /// `None` stands for "nothing arrived before the queue timeout" and is a
    /// no-op.
    pub fn call(&mut self, event: Option<StatusEvent>) -> Result<(), StatusError> {
        self.call_at(event, None)
    }

    /// Handles one event at `now`, falling back to the event timestamp and
    /// then the configured clock.
    pub fn call_at(
        &mut self,
        event: Option<StatusEvent>,
        now: Option<Timestamp>,
    ) -> Result<(), StatusError> {
        let Some(event) = event else {
            return Ok(());
        };

        match &event {
            StatusEvent::NoMoreWork => {
                let now = now.unwrap_or_else(|| self.config.now());
                return self.finish(now);
            }
            StatusEvent::RetryableError(error) => {
                self.record_retryable(error);
                return Ok(());
            }
            StatusEvent::SeekAhead(estimate) => self.announce_seek_ahead(estimate)?,
            _ => {}
        }

        let now = now
            .or_else(|| event.time())
            .unwrap_or_else(|| self.config.now());

        if event.is_estimate() {
            self.buffer_estimate(&event);
        }
        self.resolve_strategy(&event, now)?;

        let handles = self
            .aggregator
            .as_deref()
            .is_some_and(|aggregator| aggregator.can_handle(&event));
        if handles {
            self.dispatch(&event, now)?;
        }
        Ok(())
    }

    fn resolve_strategy(&mut self, event: &StatusEvent, now: Timestamp) -> Result<(), StatusError> {
        match self.phase() {
            ControllerPhase::NoStrategy if matches!(event, StatusEvent::MetadataDone { .. }) => {
                self.install(Strategy::Metadata, now)
            }
            ControllerPhase::NoStrategy | ControllerPhase::MetadataActive if event.is_data() => {
                self.install(Strategy::Data, now)
            }
            _ => Ok(()),
        }
    }

    /// Replaces the active strategy with a fresh `strategy` aggregator and
    /// replays the buffered estimates into it.
    fn install(&mut self, strategy: Strategy, now: Timestamp) -> Result<(), StatusError> {
        let replaced = self.aggregator.as_deref().map(Aggregator::strategy);
        logging::trace_strategy!(
            "switching from {:?} to {:?}, replaying {} estimates",
            replaced,
            strategy,
            self.early_estimates.len()
        );

        let aggregator: Box<dyn Aggregator> = match strategy {
            Strategy::Metadata => Box::new(MetadataAggregator::new(&self.config)),
            Strategy::Data => Box::new(DataAggregator::new(&self.config)),
        };
        self.aggregator = Some(aggregator);

        let buffered = std::mem::take(&mut self.early_estimates);
        let replayed = buffered
            .iter()
            .try_for_each(|estimate| self.dispatch(estimate, now));
        // A metadata strategy can still be replaced, so keep the estimates.
        if strategy == Strategy::Metadata {
            self.early_estimates = buffered;
        }
        replayed
    }

    fn buffer_estimate(&mut self, event: &StatusEvent) {
        if self.phase() == ControllerPhase::DataActive {
            return;
        }
        if self.early_estimates.len() >= MAX_BUFFERED_ESTIMATES {
            // Running estimates are superseded by later ones; drop those first.
            let stale = self.early_estimates.iter().position(|buffered| {
                matches!(buffered, StatusEvent::ProducerEstimate(estimate) if !estimate.is_final)
            });
            match stale {
                Some(index) => {
                    self.early_estimates.remove(index);
                }
                None => {
                    self.early_estimates.pop_front();
                }
            }
        }
        self.early_estimates.push_back(event.clone());
    }

    fn dispatch(&mut self, event: &StatusEvent, now: Timestamp) -> Result<(), StatusError> {
        if let Some(aggregator) = self.aggregator.as_deref_mut() {
            aggregator.handle_event(event);
            aggregator.update_throughput(now);
        }
        self.refresh(now)
    }

    /// Checks the print gate, then the spinner gate.
    fn refresh(&mut self, now: Timestamp) -> Result<(), StatusError> {
        if self.final_printed {
            return Ok(());
        }
        let Some(aggregator) = self.aggregator.as_deref_mut() else {
            return Ok(());
        };

        if aggregator.state().should_print_progress(now) {
            let line = aggregator.render_line();
            self.output.write_all(line.as_bytes())?;
            self.output.flush()?;
            if aggregator.state().is_final() {
                self.final_printed = true;
                return Ok(());
            }
            aggregator.state_mut().mark_refreshed(now);
        }

        if aggregator.state().should_print_spinner(now) {
            let glyph = aggregator.state_mut().advance_spinner();
            write!(self.output, "{glyph}\r")?;
            self.output.flush()?;
        }
        Ok(())
    }

    /// Handles the end-of-work sentinel: makes sure a strategy exists and
    /// writes the final line once.
    fn finish(&mut self, now: Timestamp) -> Result<(), StatusError> {
        if self.aggregator.is_none() {
            self.install(Strategy::Data, now)?;
        }
        if self.final_printed {
            return Ok(());
        }
        let Some(aggregator) = self.aggregator.as_deref_mut() else {
            return Ok(());
        };

        aggregator.state_mut().force_final();
        let line = aggregator.render_line();
        self.output.write_all(line.as_bytes())?;
        self.output.flush()?;
        self.final_printed = true;
        Ok(())
    }

    fn announce_seek_ahead(&mut self, estimate: &SeekAheadEstimate) -> Result<(), StatusError> {
        if self.announced_seek_ahead {
            return Ok(());
        }
        self.announced_seek_ahead = true;

        let mut message = format!(
            "Estimated work for this command: objects: {}",
            estimate.num_objects
        );
        if let Some(size) = estimate.total_size.filter(|size| *size > 0) {
            message.push_str(", total size: ");
            message.push_str(&human_readable(size as f64, 2));
        }
        message.push('\n');
        self.output.write_all(message.as_bytes())?;
        self.output.flush()?;
        Ok(())
    }

    fn record_retryable(&mut self, error: &RetryableError) {
        if self.config.verbose {
            logging::warn_retry!("retryable error: {}", error.error_type);
        } else {
            logging::trace_retry!("retryable error: {}", error.error_type);
        }
        self.metrics.record_retryable_error(&error.error_type);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::estimation::EstimationSource;
    use crate::event::{FileEvent, FileKind, ProducerEstimate, ProgressEvent};

    fn at(seconds: u64) -> Timestamp {
        Timestamp::from_secs(seconds)
    }

    fn config() -> StatusConfig {
        StatusConfig::unthrottled()
            .with_fixed_time(at(0))
            .with_spinner_interval(Duration::from_secs(3_600))
            .with_throughput_latency(Duration::from_secs(3_600))
    }

    fn controller() -> StatusController<Vec<u8>> {
        StatusController::new(config(), Vec::new())
    }

    fn text(controller: &StatusController<Vec<u8>>) -> String {
        String::from_utf8_lossy(controller.output()).into_owned()
    }

    fn send(controller: &mut StatusController<Vec<u8>>, event: impl Into<StatusEvent>) {
        controller
            .call(Some(event.into()))
            .expect("writing to a Vec cannot fail");
    }

    #[test]
    fn estimates_wait_for_a_strategy() {
        let mut controller = controller();
        send(&mut controller, ProducerEstimate::running(at(1), 5, Some(50)));
        assert_eq!(controller.phase(), ControllerPhase::NoStrategy);
        assert_eq!(controller.buffered_estimates(), 1);
        assert!(controller.snapshot().is_none());
        assert!(controller.output().is_empty());
    }

    #[test]
    fn timeout_is_a_no_op() {
        let mut controller = controller();
        controller.call(None).expect("no-op");
        assert_eq!(controller.phase(), ControllerPhase::NoStrategy);
        assert!(controller.output().is_empty());
    }

    #[test]
    fn metadata_completion_selects_metadata_strategy() {
        let mut controller = controller();
        send(&mut controller, SeekAheadEstimate::new(at(0), 3, None));
        send(&mut controller, StatusEvent::metadata_done(at(1)));

        assert_eq!(controller.phase(), ControllerPhase::MetadataActive);
        let snapshot = controller.snapshot().expect("strategy chosen");
        assert_eq!(snapshot.num_objects, 3);
        assert_eq!(snapshot.num_objects_source, EstimationSource::SeekAhead);
        assert_eq!(snapshot.objects_finished, 1);
    }

    #[test]
    fn data_event_replaces_metadata_and_replays_estimates() {
        let mut controller = controller();
        send(&mut controller, SeekAheadEstimate::new(at(0), 3, Some(300)));
        send(&mut controller, StatusEvent::metadata_done(at(1)));
        send(&mut controller, FileEvent::started(at(2), FileKind::Upload, "a", 100));

        assert_eq!(controller.phase(), ControllerPhase::DataActive);
        assert_eq!(controller.buffered_estimates(), 0);
        let snapshot = controller.snapshot().expect("strategy chosen");
        assert_eq!(snapshot.num_objects, 3);
        assert_eq!(snapshot.total_size, 300);
        assert_eq!(snapshot.objects_finished, 0);
        assert_eq!(snapshot.in_flight_files, 1);
    }

    #[test]
    fn data_strategy_never_reverts() {
        let mut controller = controller();
        send(&mut controller, ProgressEvent::new(at(1), "a", 10));
        send(&mut controller, StatusEvent::metadata_done(at(2)));
        assert_eq!(controller.phase(), ControllerPhase::DataActive);
        assert_eq!(controller.snapshot().map(|s| s.objects_finished), Some(0));
    }

    #[test]
    fn estimates_after_metadata_start_survive_replacement() {
        let mut controller = controller();
        send(&mut controller, StatusEvent::metadata_done(at(1)));
        send(&mut controller, ProducerEstimate::finished(at(2), 4, Some(40)));
        send(&mut controller, FileEvent::started(at(3), FileKind::Download, "a", 10));

        let snapshot = controller.snapshot().expect("strategy chosen");
        assert_eq!(snapshot.num_objects_source, EstimationSource::ProducerFinal);
        assert_eq!(snapshot.total_size, 40);
    }

    #[test]
    fn empty_job_prints_one_final_line() {
        let mut controller = controller();
        send(&mut controller, StatusEvent::NoMoreWork);
        send(&mut controller, StatusEvent::NoMoreWork);

        assert_eq!(controller.phase(), ControllerPhase::DataActive);
        assert!(controller.is_finished());
        let output = text(&controller);
        assert!(output.starts_with("/ [0 files][    0.0 B/    0.0 B]"));
        assert!(output.ends_with('\n'));
        assert_eq!(output.matches('\n').count(), 1);
        assert_eq!(output.len(), 80);
    }

    #[test]
    fn final_line_is_written_once_and_freezes_output() {
        let mut controller = controller();
        send(&mut controller, ProducerEstimate::finished(at(0), 1, Some(10)));
        send(&mut controller, FileEvent::started(at(1), FileKind::Upload, "a", 10));
        send(&mut controller, FileEvent::finished(at(2), FileKind::Upload, "a", 10));
        let before = text(&controller);
        assert!(before.ends_with('\n'));

        send(&mut controller, ProgressEvent::new(at(3), "b", 1));
        send(&mut controller, StatusEvent::NoMoreWork);
        assert_eq!(text(&controller), before);
        assert_eq!(before.matches('\n').count(), 1);
    }

    #[test]
    fn intermediate_lines_are_overwritten_in_place() {
        let mut controller = controller();
        send(&mut controller, FileEvent::started(at(1), FileKind::Upload, "a", 10));
        let output = text(&controller);
        assert!(output.ends_with('\r'));
        assert_eq!(output.len(), 81);
    }

    #[test]
    fn print_interval_throttles_lines() {
        let config = config().with_print_interval(Duration::from_secs(1));
        let mut controller = StatusController::new(config, Vec::new());
        send(&mut controller, FileEvent::started(at(0), FileKind::Upload, "a", 100));
        let after_start = controller.output().len();
        send(&mut controller, ProgressEvent::new(at(0), "a", 10));
        assert_eq!(controller.output().len(), after_start);
        send(&mut controller, ProgressEvent::new(at(1), "a", 20));
        assert!(controller.output().len() > after_start);
    }

    #[test]
    fn seek_ahead_is_announced_once() {
        let mut controller = controller();
        send(&mut controller, SeekAheadEstimate::new(at(0), 3, Some(1_536)));
        send(&mut controller, StatusEvent::metadata_done(at(1)));
        send(&mut controller, FileEvent::started(at(2), FileKind::Upload, "a", 1));
        send(&mut controller, SeekAheadEstimate::new(at(3), 3, Some(1_536)));

        let output = text(&controller);
        let announcement = "Estimated work for this command: objects: 3, total size: 1.50 KiB\n";
        assert!(output.starts_with(announcement));
        assert_eq!(output.matches("Estimated work").count(), 1);
    }

    #[test]
    fn announcement_omits_missing_size() {
        let mut controller = controller();
        send(&mut controller, SeekAheadEstimate::new(at(0), 7, None));
        assert_eq!(text(&controller), "Estimated work for this command: objects: 7\n");
    }

    #[test]
    fn retryable_errors_go_to_metrics() {
        let mut controller = controller();
        send(&mut controller, RetryableError::new(at(1), "ConnectionReset"));
        send(&mut controller, RetryableError::new(at(2), "ConnectionReset"));

        assert_eq!(controller.phase(), ControllerPhase::NoStrategy);
        assert_eq!(controller.metrics().count("ConnectionReset"), 2);
        assert!(controller.output().is_empty());
    }

    #[test]
    fn custom_collectors_receive_error_types() {
        let mut seen = Vec::new();
        {
            let collector = |error_type: &str| seen.push(error_type.to_owned());
            let mut controller = StatusController::with_metrics(config(), Vec::new(), collector);
            controller
                .call(Some(RetryableError::new(at(1), "Throttled").into()))
                .expect("no output");
        }
        assert_eq!(seen, vec!["Throttled".to_owned()]);
    }

    #[test]
    fn estimate_buffer_is_bounded() {
        let mut controller = controller();
        send(&mut controller, SeekAheadEstimate::new(at(0), 9, None));
        for n in 0..(MAX_BUFFERED_ESTIMATES as u64 + 10) {
            send(&mut controller, ProducerEstimate::running(at(1), n, None));
        }
        assert_eq!(controller.buffered_estimates(), MAX_BUFFERED_ESTIMATES);

        send(&mut controller, StatusEvent::metadata_done(at(2)));
        let snapshot = controller.snapshot().expect("strategy chosen");
        assert_eq!(snapshot.num_objects_source, EstimationSource::SeekAhead);
        assert_eq!(snapshot.num_objects, 9);
    }

    #[test]
    fn explicit_time_overrides_event_time() {
        let mut controller = StatusController::new(
            config().with_print_interval(Duration::from_secs(10)),
            Vec::new(),
        );
        controller
            .call_at(Some(ProgressEvent::new(at(0), "a", 1).into()), Some(at(5)))
            .expect("vec output");
        assert!(controller.output().is_empty());
        controller
            .call_at(Some(ProgressEvent::new(at(0), "a", 2).into()), Some(at(10)))
            .expect("vec output");
        assert!(!controller.output().is_empty());
    }
}
