//! Object-counting strategy for metadata-only commands.

use super::{Aggregator, AggregatorState, ProgressSnapshot, Strategy, join_fields};
use crate::config::StatusConfig;
use crate::estimation::EstimationSource;
use crate::event::StatusEvent;
use crate::format::{format_count, format_eta, format_percent};
use crate::time::Timestamp;

/// Counts finished objects for commands that move no data (ACL edits,
/// metadata updates, deletes).
///
/// Renders lines such as:
///
/// ```text
/// / [2/3 objects]  66% Done 1.50 objects/s ETA 00:00:01
/// ```
#[derive(Clone, Debug)]
pub struct MetadataAggregator {
    state: AggregatorState,
    old_objects_finished: u64,
    last_message_time: Timestamp,
}

impl MetadataAggregator {
    /// Creates an aggregator with no objects counted.
    #[must_use]
    pub fn new(config: &StatusConfig) -> Self {
        Self {
            state: AggregatorState::new(config),
            old_objects_finished: 0,
            last_message_time: Timestamp::ZERO,
        }
    }

    fn handle_metadata_done(&mut self, time: Timestamp) {
        let state = &mut self.state;
        state.objects_finished += 1;
        state.num_objects.accumulate(1);
        self.last_message_time = time;
        state.force_print = true;
        state.check_final();
    }
}

impl Aggregator for MetadataAggregator {
    fn strategy(&self) -> Strategy {
        Strategy::Metadata
    }

    fn can_handle(&self, event: &StatusEvent) -> bool {
        matches!(
            event,
            StatusEvent::SeekAhead(_)
                | StatusEvent::ProducerEstimate(_)
                | StatusEvent::MetadataDone { .. }
        )
    }

    fn handle_event(&mut self, event: &StatusEvent) {
        self.state.begin_event();
        match event {
            StatusEvent::SeekAhead(estimate) => self.state.apply_seek_ahead(estimate),
            StatusEvent::ProducerEstimate(estimate) => self.state.apply_producer_estimate(estimate),
            StatusEvent::MetadataDone { time } => self.handle_metadata_done(*time),
            _ => {}
        }
    }

    fn update_throughput(&mut self, now: Timestamp) {
        if !self.state.throughput_due(now) {
            return;
        }
        let finished = self.state.objects_finished;
        let delta = finished as f64 - self.old_objects_finished as f64;
        if self.state.sample_throughput(delta, self.last_message_time, now) {
            self.old_objects_finished = finished;
        }
    }

    fn render(&mut self) -> String {
        let glyph = self.state.advance_spinner().to_string();
        let state = &self.state;
        let finished = state.objects_finished;
        let total = state.num_objects.value();

        let (objects, percent) = if state.num_objects.is_at_least(EstimationSource::SeekAhead) {
            (
                format!("[{}/{} objects]", format_count(finished), format_count(total)),
                format_percent(finished, total),
            )
        } else {
            (format!("[{} objects]", format_count(finished)), String::new())
        };

        // Throughput and ETA both wait for the latency and a listing estimate.
        let rate_known = state.throughput_visible()
            && state.num_objects.is_at_least(EstimationSource::ProducerEstimate);
        let (throughput, eta) = if rate_known {
            let eta = if state.throughput > 0.0 {
                let remaining = total.saturating_sub(finished) as f64;
                format!("ETA {}", format_eta(remaining / state.throughput))
            } else {
                String::new()
            };
            (format!("{:.2} objects/s", state.throughput), eta)
        } else {
            (String::new(), String::new())
        };

        join_fields(&[&glyph, &objects, &percent, &throughput, &eta])
    }

    fn state(&self) -> &AggregatorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AggregatorState {
        &mut self.state
    }

    fn snapshot(&self) -> ProgressSnapshot {
        let state = &self.state;
        ProgressSnapshot {
            strategy: Strategy::Metadata,
            num_objects: state.num_objects.value(),
            num_objects_source: state.num_objects.source(),
            total_size: state.total_size.value(),
            total_size_source: state.total_size.source(),
            objects_finished: state.objects_finished,
            total_progress: 0,
            new_progress: 0,
            existing_progress: 0,
            in_flight_files: 0,
            components_started: 0,
            components_finished: 0,
            components_existing: 0,
            throughput: state.throughput,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{FileEvent, FileKind, ProducerEstimate, SeekAheadEstimate};

    fn at(seconds: u64) -> Timestamp {
        Timestamp::from_secs(seconds)
    }

    fn aggregator() -> MetadataAggregator {
        MetadataAggregator::new(&StatusConfig::unthrottled().with_fixed_time(at(0)))
    }

    #[test]
    fn handles_only_metadata_and_estimates() {
        let aggregator = aggregator();
        assert!(aggregator.can_handle(&StatusEvent::metadata_done(at(1))));
        assert!(aggregator.can_handle(&SeekAheadEstimate::new(at(1), 1, None).into()));
        assert!(!aggregator.can_handle(&FileEvent::started(at(1), FileKind::Upload, "a", 1).into()));
        assert!(!aggregator.can_handle(&StatusEvent::NoMoreWork));
    }

    #[test]
    fn metadata_done_counts_and_forces_print() {
        let mut aggregator = aggregator();
        aggregator.handle_event(&StatusEvent::metadata_done(at(1)));
        aggregator.handle_event(&StatusEvent::metadata_done(at(2)));

        let snapshot = aggregator.snapshot();
        assert_eq!(snapshot.objects_finished, 2);
        assert_eq!(snapshot.num_objects, 2);
        assert_eq!(snapshot.num_objects_source, EstimationSource::IndividualMessages);
        assert!(aggregator.state().force_print);
        assert!(!aggregator.state().is_final());
    }

    #[test]
    fn estimate_clears_force_print() {
        let mut aggregator = aggregator();
        aggregator.handle_event(&StatusEvent::metadata_done(at(1)));
        aggregator.handle_event(&ProducerEstimate::running(at(2), 5, None).into());
        assert!(!aggregator.state().force_print);
    }

    #[test]
    fn final_line_when_final_total_reached() {
        let mut aggregator = aggregator();
        aggregator.handle_event(&ProducerEstimate::finished(at(0), 2, None).into());
        aggregator.handle_event(&StatusEvent::metadata_done(at(1)));
        assert!(!aggregator.state().is_final());
        aggregator.handle_event(&StatusEvent::metadata_done(at(2)));
        assert!(aggregator.state().is_final());
        assert_eq!(aggregator.snapshot().num_objects, 2);
    }

    #[test]
    fn throughput_counts_objects_between_samples() {
        let mut aggregator = aggregator();
        for second in 1..=4 {
            aggregator.handle_event(&StatusEvent::metadata_done(at(second)));
        }
        aggregator.update_throughput(at(4));
        assert!((aggregator.snapshot().throughput - 1.0).abs() < f64::EPSILON);

        aggregator.handle_event(&StatusEvent::metadata_done(at(6)));
        aggregator.update_throughput(at(6));
        assert!((aggregator.snapshot().throughput - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn throughput_waits_for_first_completion() {
        let mut aggregator = aggregator();
        aggregator.handle_event(&SeekAheadEstimate::new(at(1), 3, None).into());
        aggregator.update_throughput(at(5));
        assert!(aggregator.snapshot().throughput.abs() < f64::EPSILON);
    }

    #[test]
    fn render_without_reliable_total() {
        let config = StatusConfig::unthrottled()
            .with_fixed_time(at(0))
            .with_throughput_latency(std::time::Duration::from_secs(10));
        let mut aggregator = MetadataAggregator::new(&config);
        aggregator.handle_event(&StatusEvent::metadata_done(at(1)));
        // The refresh time has not moved, so the latency gate stays shut.
        let line = aggregator.render();
        assert_eq!(line, "/ [1 objects]");
    }

    #[test]
    fn rate_needs_a_listing_estimate() {
        let mut aggregator = aggregator();
        aggregator.handle_event(&StatusEvent::metadata_done(at(1)));
        aggregator.handle_event(&StatusEvent::metadata_done(at(2)));
        aggregator.update_throughput(at(2));

        assert!(aggregator.snapshot().throughput > 0.0);
        assert_eq!(aggregator.render(), "/ [2 objects]");
    }

    #[test]
    fn render_with_estimate_throughput_and_eta() {
        let mut aggregator = aggregator();
        aggregator.handle_event(&SeekAheadEstimate::new(at(0), 4, None).into());
        aggregator.handle_event(&StatusEvent::metadata_done(at(1)));
        aggregator.handle_event(&StatusEvent::metadata_done(at(2)));
        aggregator.update_throughput(at(2));
        aggregator.state_mut().mark_refreshed(at(2));

        let line = aggregator.render();
        assert_eq!(line, "/ [2/4 objects]  50% Done 1.00 objects/s ETA 00:00:02");
        assert!(aggregator.render().starts_with('-'));
    }
}
