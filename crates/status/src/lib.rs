#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `status` aggregates progress events from many concurrent transfer workers
//! into one stream of rate-limited, in-place progress lines.
//!
//! Workers emit typed [`StatusEvent`]s: total-work estimates, file and
//! component start/finish, mid-transfer byte counts, metadata completions,
//! and retryable errors. A single [`StatusController`] consumes them, picks
//! an aggregation strategy from the first decisive event, and renders lines
//! terminated with `\r` (overwritten by the next one) until the final line,
//! which ends with `\n`.
//!
//! # Design
//!
//! - [`estimation`] ranks the competing sources of "how much work is there"
//!   and only lets an equal or better source replace an estimate.
//! - [`aggregator`] holds the two strategies: [`MetadataAggregator`] counts
//!   objects and [`DataAggregator`] tracks bytes per file and component,
//!   crediting bytes from resumed transfers without counting them as
//!   throughput.
//! - [`controller`] selects and replaces strategies, buffers early
//!   estimates for replay, and applies the print and spinner gates.
//! - [`queue`] delivers events either inline or through a dedicated consumer
//!   thread fed by a multi-producer channel.
//!
//! # Examples
//!
//! ```
//! use status::{
//!     FileEvent, FileKind, InlineStatusQueue, StatusConfig, StatusController, StatusQueue,
//!     Timestamp,
//! };
//!
//! let config = StatusConfig::unthrottled().with_fixed_time(Timestamp::ZERO);
//! let mut queue = InlineStatusQueue::new(StatusController::new(config, Vec::new()));
//!
//! let at = Timestamp::from_secs(1);
//! queue.put(FileEvent::started(at, FileKind::Upload, "a.txt", 2_048).into())?;
//! queue.put(FileEvent::finished(at, FileKind::Upload, "a.txt", 2_048).into())?;
//! queue.finish()?;
//!
//! let controller = queue.into_controller();
//! let output = String::from_utf8_lossy(controller.output());
//! assert!(output.ends_with('\n'));
//! assert_eq!(controller.snapshot().map(|s| s.total_progress), Some(2_048));
//! # Ok::<(), status::StatusError>(())
//! ```

pub mod aggregator;
pub mod config;
pub mod controller;
pub mod error;
pub mod estimation;
pub mod event;
pub mod format;
pub mod metrics;
pub mod queue;
pub mod time;

pub use aggregator::{
    Aggregator, AggregatorState, DataAggregator, MetadataAggregator, ProgressSnapshot, Strategy,
};
pub use config::StatusConfig;
pub use controller::{ControllerPhase, MAX_BUFFERED_ESTIMATES, StatusController};
pub use error::StatusError;
pub use estimation::{Estimate, EstimationSource, should_adopt};
pub use event::{
    FileEvent, FileKind, ProducerEstimate, ProgressEvent, RetryableError, SeekAheadEstimate,
    StatusEvent,
};
pub use metrics::{ErrorMetrics, RetryableErrorCounts};
pub use queue::{
    ConsumerConfig, ConsumerHandle, DEFAULT_POLL_TIMEOUT, InlineStatusQueue, StatusQueue,
    StatusReceiver, StatusSender, channel, run_consumer, spawn_consumer,
};
pub use time::Timestamp;
