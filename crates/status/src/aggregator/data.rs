//! Byte-tracking strategy for commands that move data.
//!
//! Files and their components report progress independently. Each in-flight
//! file owns a [`FileProgressRecord`] that remembers, per component, the
//! last `(new, existing)` pair seen so that absolute byte counts can be
//! turned into increments. Resumed bytes are credited to total progress as
//! soon as they are discovered but are kept out of the throughput figure.

use rustc_hash::FxHashMap;

use super::record::signed;
use super::{
    Aggregator, AggregatorState, ComponentBytes, ComponentKey, FileProgressRecord,
    ProgressSnapshot, Strategy, join_fields,
};
use crate::config::StatusConfig;
use crate::estimation::EstimationSource;
use crate::event::{FileEvent, FileKind, ProgressEvent, StatusEvent};
use crate::format::{fixed_width_bytes, format_count, format_eta, format_percent};
use crate::time::Timestamp;

/// Tracks per-file and per-component bytes for data-moving commands.
///
/// Renders lines such as:
///
/// ```text
/// / [1/2 files][  1.0 KiB/  2.0 KiB]  50% Done   512.0 B/s ETA 00:00:02
/// ```
#[derive(Clone, Debug)]
pub struct DataAggregator {
    state: AggregatorState,
    first_item: bool,
    files: FxHashMap<String, FileProgressRecord>,

    total_progress: i64,
    new_progress: i64,
    existing_progress: i64,
    old_progress: i64,
    last_progress_time: Timestamp,

    components_started: u64,
    components_finished: u64,
    components_existing: u64,
}

impl DataAggregator {
    /// Creates an aggregator with no files in flight.
    #[must_use]
    pub fn new(config: &StatusConfig) -> Self {
        Self {
            state: AggregatorState::new(config),
            first_item: !config.has_fixed_time(),
            files: FxHashMap::default(),
            total_progress: 0,
            new_progress: 0,
            existing_progress: 0,
            old_progress: 0,
            last_progress_time: Timestamp::ZERO,
            components_started: 0,
            components_finished: 0,
            components_existing: 0,
        }
    }

    /// Record of an in-flight file, if its start has been seen and its finish
    /// has not.
    #[must_use]
    pub fn file_record(&self, src: &str) -> Option<&FileProgressRecord> {
        self.files.get(src)
    }

    fn handle_file(&mut self, event: &FileEvent) {
        match (event.kind.is_whole_file(), event.finished) {
            (true, false) => self.start_file(event),
            (true, true) => self.finish_file(event),
            (false, _) => self.handle_component(event),
        }
    }

    fn start_file(&mut self, event: &FileEvent) {
        // Keep start-up latency out of the throughput window.
        if self.first_item {
            self.state.restart_clocks(Timestamp::now());
            self.first_item = false;
        }

        self.files
            .insert(event.src.clone(), FileProgressRecord::new(event.size));
        self.state.num_objects.accumulate(1);
        self.state.total_size.accumulate(event.size);
        self.state.force_print = true;
    }

    fn finish_file(&mut self, event: &FileEvent) {
        self.state.objects_finished += 1;

        let record = self.files.remove(&event.src).unwrap_or_else(|| {
            logging::trace_accounting!("finish for untracked file {}", event.src);
            FileProgressRecord::new(event.size)
        });
        let unaccounted = record.unaccounted();
        if unaccounted != 0 {
            logging::trace_accounting!("{} reconciled {} unreported bytes", event.src, unaccounted);
        }
        self.total_progress += unaccounted;
        self.new_progress += unaccounted;

        self.state.force_print = true;
        self.state.check_final();
    }

    fn handle_component(&mut self, event: &FileEvent) {
        match (event.kind, event.finished) {
            (FileKind::ExistingComponent, false) => self.existing_component(event),
            (FileKind::ComponentToUpload | FileKind::ComponentToDownload, false) => {
                self.start_component(event);
            }
            (FileKind::ComponentToUpload | FileKind::ComponentToDownload, true) => {
                self.finish_component(event);
            }
            _ => {}
        }
    }

    fn existing_component(&mut self, event: &FileEvent) {
        self.components_existing += 1;
        let Some(record) = self.files.get_mut(&event.src) else {
            logging::trace_accounting!("existing component for untracked file {}", event.src);
            return;
        };

        let size = signed(event.size);
        record.set_component(component_key(event), ComponentBytes::new(0, size));
        record.existing_sum += size;
        self.total_progress += size;
        self.existing_progress += size;
    }

    fn start_component(&mut self, event: &FileEvent) {
        self.components_started += 1;
        // Upload-side resume bytes are reconciled when the component finishes.
        if event.kind != FileKind::ComponentToDownload {
            return;
        }
        let Some(record) = self.files.get_mut(&event.src) else {
            logging::trace_accounting!("component start for untracked file {}", event.src);
            return;
        };

        let already_done = signed(event.bytes_already_done.unwrap_or(0));
        record.existing_sum += already_done;
        record.set_component(component_key(event), ComponentBytes::new(0, already_done));
        self.total_progress += already_done;
        self.existing_progress += already_done;
    }

    fn finish_component(&mut self, event: &FileEvent) {
        self.components_finished += 1;
        let Some(record) = self.files.get_mut(&event.src) else {
            logging::trace_accounting!("component finish for untracked file {}", event.src);
            return;
        };

        let key = component_key(event);
        let last = record.component(&key);
        let size = signed(event.size);
        let delta = size - last.total();
        self.total_progress += delta;
        self.new_progress += delta;
        record.new_sum += delta;
        // The component now accounts for exactly `size` bytes, so a late
        // progress report for it adds nothing.
        record.set_component(key, ComponentBytes::new(size - last.existing, last.existing));
    }

    fn handle_progress(&mut self, event: &ProgressEvent) {
        self.last_progress_time = event.time;
        let Some(record) = self.files.get_mut(&event.src) else {
            logging::trace_accounting!("progress for untracked file {}", event.src);
            return;
        };

        let key: ComponentKey = (event.component, event.dst.clone());
        let last = record.component(&key);
        let run_bytes = signed(event.processed_bytes) - last.existing;
        let increment = run_bytes - last.new;
        record.new_sum += increment;
        self.total_progress += increment;
        self.new_progress += increment;
        record.set_component(key, ComponentBytes::new(run_bytes, last.existing));
    }
}

impl Aggregator for DataAggregator {
    fn strategy(&self) -> Strategy {
        Strategy::Data
    }

    fn can_handle(&self, event: &StatusEvent) -> bool {
        matches!(
            event,
            StatusEvent::SeekAhead(_)
                | StatusEvent::ProducerEstimate(_)
                | StatusEvent::File(_)
                | StatusEvent::Progress(_)
        )
    }

    fn handle_event(&mut self, event: &StatusEvent) {
        self.state.begin_event();
        match event {
            StatusEvent::SeekAhead(estimate) => self.state.apply_seek_ahead(estimate),
            StatusEvent::ProducerEstimate(estimate) => self.state.apply_producer_estimate(estimate),
            StatusEvent::File(file) => self.handle_file(file),
            StatusEvent::Progress(progress) => self.handle_progress(progress),
            _ => {}
        }
    }

    fn update_throughput(&mut self, now: Timestamp) {
        if !self.state.throughput_due(now) {
            return;
        }
        let delta = (self.new_progress - self.old_progress) as f64;
        if self
            .state
            .sample_throughput(delta, self.last_progress_time, now)
        {
            self.old_progress = self.new_progress;
        }
    }

    fn render(&mut self) -> String {
        let glyph = self.state.advance_spinner();
        let state = &self.state;
        let done = unsigned(self.total_progress);
        let total = state.total_size.value();

        let objects = if state.num_objects.is_at_least(EstimationSource::SeekAhead) {
            format!(
                "[{}/{} files]",
                format_count(state.objects_finished),
                format_count(state.num_objects.value())
            )
        } else {
            format!("[{} files]", format_count(state.objects_finished))
        };
        let bytes = format!(
            "[{}/{}]",
            fixed_width_bytes(done as f64),
            fixed_width_bytes(total as f64)
        );
        let head = format!("{glyph} {objects}{bytes}");

        let percent = if state.total_size.is_at_least(EstimationSource::SeekAhead) {
            format_percent(done, total)
        } else {
            String::new()
        };

        let rate_known = state.throughput_visible()
            && state.total_size.is_at_least(EstimationSource::ProducerEstimate);
        let (throughput, eta) = if rate_known {
            let eta = if state.throughput > 0.0 {
                let remaining = total.saturating_sub(done) as f64;
                format!("ETA {}", format_eta(remaining / state.throughput))
            } else {
                String::new()
            };
            (format!("{}/s", fixed_width_bytes(state.throughput)), eta)
        } else {
            (String::new(), String::new())
        };

        join_fields(&[&head, &percent, &throughput, &eta])
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
            strategy: Strategy::Data,
            num_objects: state.num_objects.value(),
            num_objects_source: state.num_objects.source(),
            total_size: state.total_size.value(),
            total_size_source: state.total_size.source(),
            objects_finished: state.objects_finished,
            total_progress: unsigned(self.total_progress),
            new_progress: unsigned(self.new_progress),
            existing_progress: unsigned(self.existing_progress),
            in_flight_files: self.files.len(),
            components_started: self.components_started,
            components_finished: self.components_finished,
            components_existing: self.components_existing,
            throughput: state.throughput,
        }
    }
}

fn component_key(event: &FileEvent) -> ComponentKey {
    (event.component, event.dst.clone())
}

fn unsigned(bytes: i64) -> u64 {
    u64::try_from(bytes).unwrap_or(0)
}
