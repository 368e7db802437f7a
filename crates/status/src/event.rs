//! Status events emitted by transfer workers.
//!
//! Every event except [`StatusEvent::NoMoreWork`] carries the [`Timestamp`]
//! at which the producer created it. The controller uses that time for all
//! throughput and print-gating decisions, so events may arrive out of
//! wall-clock order across producers without skewing the display.

use crate::time::Timestamp;

/// What a [`FileEvent`] describes.
///
/// The first seven kinds describe whole objects; the remaining three describe
/// a slice of an object transferred in parallel components.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileKind {
    /// Object downloaded to local storage.
    Download,
    /// Local file uploaded to the cloud.
    Upload,
    /// Object copied inside the cloud provider.
    CloudCopy,
    /// Object copied between providers through this host.
    DaisyCopy,
    /// Local file copied to another local path.
    LocalCopy,
    /// Object rewritten in place.
    Rewrite,
    /// Object hashed without being transferred.
    Hash,
    /// Component already transferred by an earlier, resumed run.
    ExistingComponent,
    /// Component of a parallel composite upload.
    ComponentToUpload,
    /// Component of a sliced download.
    ComponentToDownload,
}

impl FileKind {
    /// Reports whether this kind describes a whole object.
    #[must_use]
    pub const fn is_whole_file(self) -> bool {
        !self.is_component()
    }

    /// Reports whether this kind describes a component of an object.
    #[must_use]
    pub const fn is_component(self) -> bool {
        matches!(
            self,
            Self::ExistingComponent | Self::ComponentToUpload | Self::ComponentToDownload
        )
    }
}

/// Running or final estimate from the listing thread.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProducerEstimate {
    /// When the estimate was produced.
    pub time: Timestamp,
    /// Objects enumerated so far.
    pub num_objects: u64,
    /// Bytes enumerated so far, when the listing knows sizes.
    pub total_size: Option<u64>,
    /// Set on the last, authoritative estimate.
    pub is_final: bool,
}

impl ProducerEstimate {
    /// Creates a non-final estimate.
    #[must_use]
    pub const fn running(time: Timestamp, num_objects: u64, total_size: Option<u64>) -> Self {
        Self {
            time,
            num_objects,
            total_size,
            is_final: false,
        }
    }

    /// Creates the final estimate.
    #[must_use]
    pub const fn finished(time: Timestamp, num_objects: u64, total_size: Option<u64>) -> Self {
        Self {
            time,
            num_objects,
            total_size,
            is_final: true,
        }
    }
}

/// One-time estimate produced by the pre-scan thread.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeekAheadEstimate {
    /// When the estimate was produced.
    pub time: Timestamp,
    /// Objects the job is expected to process.
    pub num_objects: u64,
    /// Bytes the job is expected to move, if known.
    pub total_size: Option<u64>,
}

impl SeekAheadEstimate {
    /// Creates a pre-scan estimate.
    #[must_use]
    pub const fn new(time: Timestamp, num_objects: u64, total_size: Option<u64>) -> Self {
        Self {
            time,
            num_objects,
            total_size,
        }
    }
}

/// Describes a whole object or a component starting or finishing.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileEvent {
    /// When the event was produced.
    pub time: Timestamp,
    /// Object or component kind.
    pub kind: FileKind,
    /// Source identifier; keys the per-file record.
    pub src: String,
    /// Destination identifier.
    pub dst: Option<String>,
    /// Component index for component kinds.
    pub component: Option<u32>,
    /// Size of the object or component in bytes.
    pub size: u64,
    /// Bytes a resumed download already has on disk.
    pub bytes_already_done: Option<u64>,
    /// `false` when the transfer starts, `true` when it completes.
    pub finished: bool,
}

impl FileEvent {
    /// Creates a start event.
    pub fn started(time: Timestamp, kind: FileKind, src: impl Into<String>, size: u64) -> Self {
        Self {
            time,
            kind,
            src: src.into(),
            dst: None,
            component: None,
            size,
            bytes_already_done: None,
            finished: false,
        }
    }

    /// Creates a completion event.
    pub fn finished(time: Timestamp, kind: FileKind, src: impl Into<String>, size: u64) -> Self {
        Self {
            finished: true,
            ..Self::started(time, kind, src, size)
        }
    }

    /// Attaches a component index and destination.
    pub fn with_component(mut self, index: u32, dst: impl Into<String>) -> Self {
        self.component = Some(index);
        self.dst = Some(dst.into());
        self
    }

    /// Attaches a destination without a component index.
    pub fn with_dst(mut self, dst: impl Into<String>) -> Self {
        self.dst = Some(dst.into());
        self
    }

    /// Records bytes a resumed download already holds.
    pub fn with_bytes_already_done(mut self, bytes: u64) -> Self {
        self.bytes_already_done = Some(bytes);
        self
    }
}

/// Absolute byte count reported mid-transfer for an object or component.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressEvent {
    /// When the event was produced.
    pub time: Timestamp,
    /// Source identifier of the owning object.
    pub src: String,
    /// Destination identifier.
    pub dst: Option<String>,
    /// Component index, if the report is for a component.
    pub component: Option<u32>,
    /// Bytes processed so far, including bytes from a resumed run.
    pub processed_bytes: u64,
}

impl ProgressEvent {
    /// Creates a whole-object progress report.
    pub fn new(time: Timestamp, src: impl Into<String>, processed_bytes: u64) -> Self {
        Self {
            time,
            src: src.into(),
            dst: None,
            component: None,
            processed_bytes,
        }
    }

    /// Attaches a component index and destination.
    pub fn with_component(mut self, index: u32, dst: impl Into<String>) -> Self {
        self.component = Some(index);
        self.dst = Some(dst.into());
        self
    }

    /// Attaches a destination without a component index.
    pub fn with_dst(mut self, dst: impl Into<String>) -> Self {
        self.dst = Some(dst.into());
        self
    }
}

/// Recoverable failure reported by a worker.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryableError {
    /// When the error occurred.
    pub time: Timestamp,
    /// Error classification used as the metrics key.
    pub error_type: String,
}

impl RetryableError {
    /// Creates a retryable error report.
    pub fn new(time: Timestamp, error_type: impl Into<String>) -> Self {
        Self {
            time,
            error_type: error_type.into(),
        }
    }
}

/// Every message a worker can hand to the status subsystem.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusEvent {
    /// Listing thread estimate.
    ProducerEstimate(ProducerEstimate),
    /// Pre-scan estimate.
    SeekAhead(SeekAheadEstimate),
    /// One metadata-only object finished.
    MetadataDone {
        /// When the object finished.
        time: Timestamp,
    },
    /// Object or component start/finish.
    File(FileEvent),
    /// Mid-transfer byte count.
    Progress(ProgressEvent),
    /// Recoverable error for metrics.
    RetryableError(RetryableError),
    /// All producers are done; drain and stop.
    NoMoreWork,
}

impl StatusEvent {
    /// Creates a metadata completion event.
    #[must_use]
    pub const fn metadata_done(time: Timestamp) -> Self {
        Self::MetadataDone { time }
    }

    /// Returns the producer timestamp, or `None` for the sentinel.
    #[must_use]
    pub const fn time(&self) -> Option<Timestamp> {
        match self {
            Self::ProducerEstimate(estimate) => Some(estimate.time),
            Self::SeekAhead(estimate) => Some(estimate.time),
            Self::MetadataDone { time } => Some(*time),
            Self::File(file) => Some(file.time),
            Self::Progress(progress) => Some(progress.time),
            Self::RetryableError(error) => Some(error.time),
            Self::NoMoreWork => None,
        }
    }

    /// Reports whether the event is a total-work estimate.
    #[must_use]
    pub const fn is_estimate(&self) -> bool {
        matches!(self, Self::ProducerEstimate(_) | Self::SeekAhead(_))
    }

    /// Reports whether only a data-moving strategy can describe the event.
    #[must_use]
    pub const fn is_data(&self) -> bool {
        matches!(self, Self::File(_) | Self::Progress(_))
    }

    /// Reports whether this is the end-of-work sentinel.
    #[must_use]
    pub const fn is_sentinel(&self) -> bool {
        matches!(self, Self::NoMoreWork)
    }

    /// Short name used in diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::ProducerEstimate(estimate) if estimate.is_final => "producer-final",
            Self::ProducerEstimate(_) => "producer-estimate",
            Self::SeekAhead(_) => "seek-ahead",
            Self::MetadataDone { .. } => "metadata-done",
            Self::File(_) => "file",
            Self::Progress(_) => "progress",
            Self::RetryableError(_) => "retryable-error",
            Self::NoMoreWork => "no-more-work",
        }
    }
}

impl From<ProducerEstimate> for StatusEvent {
    fn from(estimate: ProducerEstimate) -> Self {
        Self::ProducerEstimate(estimate)
    }
}

impl From<SeekAheadEstimate> for StatusEvent {
    fn from(estimate: SeekAheadEstimate) -> Self {
        Self::SeekAhead(estimate)
    }
}

impl From<FileEvent> for StatusEvent {
    fn from(event: FileEvent) -> Self {
        Self::File(event)
    }
}

impl From<ProgressEvent> for StatusEvent {
    fn from(event: ProgressEvent) -> Self {
        Self::Progress(event)
    }
}

impl From<RetryableError> for StatusEvent {
    fn from(error: RetryableError) -> Self {
        Self::RetryableError(error)
    }
}
