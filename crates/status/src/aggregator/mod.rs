//! Aggregation strategies.
//!
//! An [`Aggregator`] turns accepted events into counters and renders a
//! progress line from them. Two strategies exist: [`MetadataAggregator`]
//! counts objects for metadata-only commands and [`DataAggregator`] tracks
//! bytes for commands that move data. Both embed an [`AggregatorState`] for
//! the clocks, totals and gates they share.

mod data;
mod metadata;
mod record;
mod state;

pub use data::DataAggregator;
pub use metadata::MetadataAggregator;
pub use record::{ComponentBytes, ComponentKey, FileProgressRecord};
pub use state::{AggregatorState, SPINNER_GLYPHS};

use crate::estimation::EstimationSource;
use crate::event::StatusEvent;
use crate::time::Timestamp;

/// Which aggregation strategy produced a snapshot.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    /// Object counting for metadata-only commands.
    Metadata,
    /// Byte tracking for data-moving commands.
    Data,
}

/// Read-only view of an aggregator's counters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressSnapshot {
    /// Strategy that produced the snapshot.
    pub strategy: Strategy,
    /// Estimated number of objects.
    pub num_objects: u64,
    /// Source of the object estimate.
    pub num_objects_source: EstimationSource,
    /// Estimated total bytes; always zero for metadata commands.
    pub total_size: u64,
    /// Source of the size estimate.
    pub total_size_source: EstimationSource,
    /// Objects finished.
    pub objects_finished: u64,
    /// Bytes completed, including bytes from resumed runs.
    pub total_progress: u64,
    /// Bytes moved by this run.
    pub new_progress: u64,
    /// Bytes credited from resumed runs.
    pub existing_progress: u64,
    /// Files between their start and finish events.
    pub in_flight_files: usize,
    /// Components started.
    pub components_started: u64,
    /// Components finished.
    pub components_finished: u64,
    /// Components found complete from a resumed run.
    pub components_existing: u64,
    /// Latest throughput in objects or bytes per second.
    pub throughput: f64,
}

/// Capability-tagged interface implemented by each strategy.
pub trait Aggregator: Send {
    /// Strategy implemented by this aggregator.
    fn strategy(&self) -> Strategy;

    /// Reports whether this strategy understands `event`.
    fn can_handle(&self, event: &StatusEvent) -> bool;

    /// Applies `event` to the counters. Events the strategy does not
    /// understand are ignored.
    fn handle_event(&mut self, event: &StatusEvent);

    /// Recomputes throughput if the sampling period has elapsed at `now`.
    fn update_throughput(&mut self, now: Timestamp);

    /// Renders the progress line body, advancing the spinner.
    fn render(&mut self) -> String;

    /// Shared state.
    fn state(&self) -> &AggregatorState;

    /// Shared state, mutably.
    fn state_mut(&mut self) -> &mut AggregatorState;

    /// Copies the current counters.
    fn snapshot(&self) -> ProgressSnapshot;

    /// Renders a full line: padded body plus terminator.
    fn render_line(&mut self) -> String {
        let body = self.render();
        self.state().terminate_line(&body)
    }
}

/// Joins the non-empty `fields` with single spaces.
fn join_fields(fields: &[&str]) -> String {
    fields
        .iter()
        .filter(|field| !field.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_fields_skips_empty_entries() {
        assert_eq!(join_fields(&["/", "[1 objects]", "", "ETA 00:00:01"]), "/ [1 objects] ETA 00:00:01");
        assert_eq!(join_fields(&["", ""]), "");
    }
}
