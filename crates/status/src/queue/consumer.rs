use std::io::Write;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::controller::StatusController;
use crate::error::StatusError;
use crate::event::StatusEvent;
use crate::metrics::{ErrorMetrics, RetryableErrorCounts};

/// Default bound on how long the consumer waits for the next event.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(1);

const THREAD_NAME: &str = "xferstat-status";

/// Configuration for the consumer thread.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConsumerConfig {
    /// Longest wait for an event before the controller is called with
    /// nothing. Zero waits indefinitely.
    pub poll_timeout: Duration,
    /// Bounded channel capacity; `None` for an unbounded channel.
    pub channel_capacity: Option<usize>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            channel_capacity: None,
        }
    }
}

impl ConsumerConfig {
    /// Sets the poll timeout.
    pub const fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Bounds the channel so producers block once `capacity` events queue up.
    pub const fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = Some(capacity);
        self
    }
}

/// Cloneable producer side of the consumer channel.
#[derive(Clone, Debug)]
pub struct StatusSender {
    tx: Sender<StatusEvent>,
}

impl StatusSender {
    /// Enqueues `event`.
    ///
    /// Fails with [`StatusError::QueueClosed`] once the consumer has stopped.
    pub fn send(&self, event: impl Into<StatusEvent>) -> Result<(), StatusError> {
        self.tx
            .send(event.into())
            .map_err(|_| StatusError::QueueClosed)
    }

    /// Enqueues the end-of-work sentinel.
    ///
    /// Call exactly once, after every producer is done.
    pub fn finish(&self) -> Result<(), StatusError> {
        self.send(StatusEvent::NoMoreWork)
    }
}

/// Running consumer thread.
pub struct ConsumerHandle<W, M = RetryableErrorCounts> {
    sender: StatusSender,
    thread: JoinHandle<StatusController<W, M>>,
}

impl<W, M> ConsumerHandle<W, M> {
    /// Returns a new sender for a producer.
    #[must_use]
    pub fn sender(&self) -> StatusSender {
        self.sender.clone()
    }

    /// Waits for the consumer to stop and returns its controller.
    ///
    /// The handle's own sender is dropped first, so the consumer also stops
    /// if every producer went away without sending the sentinel.
    pub fn join(self) -> Result<StatusController<W, M>, StatusError> {
        let Self { sender, thread } = self;
        drop(sender);
        thread.join().map_err(|_| StatusError::ConsumerPanicked)
    }
}

/// Receiving side of the status channel, drained by [`run_consumer`].
#[derive(Debug)]
pub struct StatusReceiver {
    rx: Receiver<StatusEvent>,
    poll_timeout: Duration,
}

/// Creates a connected sender and receiver.
///
/// Use this with [`run_consumer`] when the consumer has to run on a thread
/// the caller already owns, such as inside [`std::thread::scope`].
pub fn channel(config: &ConsumerConfig) -> (StatusSender, StatusReceiver) {
    let (tx, rx) = match config.channel_capacity {
        Some(capacity) => crossbeam_channel::bounded(capacity),
        None => crossbeam_channel::unbounded(),
    };
    (
        StatusSender { tx },
        StatusReceiver {
            rx,
            poll_timeout: config.poll_timeout,
        },
    )
}

/// Starts the consumer thread that owns `controller`.
///
/// The thread must be running before any producer enqueues, so spawn it
/// first and hand out [`ConsumerHandle::sender`] clones afterwards.
pub fn spawn_consumer<W, M>(
    controller: StatusController<W, M>,
    config: &ConsumerConfig,
) -> Result<ConsumerHandle<W, M>, StatusError>
where
    W: Write + Send + 'static,
    M: ErrorMetrics + Send + 'static,
{
    let (sender, receiver) = channel(config);

    let thread = thread::Builder::new()
        .name(THREAD_NAME.to_owned())
        .spawn(move || {
            let mut controller = controller;
            run_consumer(&mut controller, &receiver);
            controller
        })
        .map_err(StatusError::Spawn)?;

    Ok(ConsumerHandle { sender, thread })
}

/// Drains `receiver` into `controller` on the calling thread until the
/// end-of-work sentinel has been handled.
///
/// A wait that times out calls the controller with no event. If every
/// sender is dropped first, the sentinel is synthesized so the final line
/// is still written.
pub fn run_consumer<W: Write, M: ErrorMetrics>(
    controller: &mut StatusController<W, M>,
    receiver: &StatusReceiver,
) {
    logging::trace_consumer!("status consumer started");

    loop {
        let received = if receiver.poll_timeout.is_zero() {
            receiver.rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
        } else {
            receiver.rx.recv_timeout(receiver.poll_timeout)
        };
        let event = match received {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                logging::warn_consumer!("every status sender dropped before end of work");
                Some(StatusEvent::NoMoreWork)
            }
        };

        let done = event.as_ref().is_some_and(StatusEvent::is_sentinel);
        let kind = event.as_ref().map_or("timeout", StatusEvent::kind_name);
        if let Err(error) = controller.call(event) {
            logging::warn_consumer!(%error, kind, "status event dropped");
        }
        if done {
            break;
        }
    }

    logging::trace_consumer!("status consumer stopped");
}
