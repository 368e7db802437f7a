//! Error types for the status subsystem.

use std::io;

/// Error type for status aggregation and delivery.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    /// Writing a progress line to the output stream failed.
    #[error("failed to write progress output: {0}")]
    Output(#[from] io::Error),

    /// The consumer thread could not be started.
    #[error("failed to spawn status consumer thread: {0}")]
    Spawn(#[source] io::Error),

    /// The consumer thread panicked before returning its controller.
    #[error("status consumer thread panicked")]
    ConsumerPanicked,

    /// An event was sent after the consumer stopped receiving.
    #[error("status queue is closed")]
    QueueClosed,
}

impl StatusError {
    /// Reports whether the error came from the output stream.
    #[must_use]
    pub const fn is_output(&self) -> bool {
        matches!(self, Self::Output(_))
    }
}
