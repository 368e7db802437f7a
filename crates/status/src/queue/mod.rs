//! Hand-off from producers to the controller.
//!
//! Two adapters expose the same "accept one event" contract:
//!
//! - [`InlineStatusQueue`] calls the controller on the submitting thread and
//!   is used when a command runs without worker concurrency.
//! - [`spawn_consumer`] starts a dedicated consumer thread that drains a
//!   multi-producer channel. Producers hold cloned [`StatusSender`]s.
//!   [`channel`] and [`run_consumer`] do the same on a thread the caller
//!   already owns.
//!
//! # Thread Protocol
//!
//! ```text
//! Worker threads                      Consumer thread
//! ──────────────                      ───────────────
//! send(event)  ──────────────────▶    controller.call(Some(event))
//! (quiet)                             timeout → controller.call(None)
//! finish()     ──────────────────▶    controller.call(NoMoreWork), exit
//!              ◀──────────────────    join() returns the controller
//! ```

mod consumer;
mod inline;

pub use consumer::{
    ConsumerConfig, ConsumerHandle, DEFAULT_POLL_TIMEOUT, StatusReceiver, StatusSender, channel,
    run_consumer, spawn_consumer,
};
pub use inline::InlineStatusQueue;

use crate::error::StatusError;
use crate::event::StatusEvent;

/// Accepts status events from producers.
pub trait StatusQueue {
    /// Submits one event.
    fn put(&mut self, event: StatusEvent) -> Result<(), StatusError>;

    /// Submits the end-of-work sentinel.
    fn finish(&mut self) -> Result<(), StatusError> {
        self.put(StatusEvent::NoMoreWork)
    }
}

impl StatusQueue for StatusSender {
    fn put(&mut self, event: StatusEvent) -> Result<(), StatusError> {
        self.send(event)
    }
}
