use std::io::Write;

use super::StatusQueue;
use crate::controller::StatusController;
use crate::error::StatusError;
use crate::event::StatusEvent;
use crate::metrics::{ErrorMetrics, RetryableErrorCounts};

/// Synchronous adapter that forwards each event straight to the controller.
pub struct InlineStatusQueue<W, M = RetryableErrorCounts> {
    controller: StatusController<W, M>,
}

impl<W: Write, M: ErrorMetrics> InlineStatusQueue<W, M> {
    /// Wraps `controller`.
    pub const fn new(controller: StatusController<W, M>) -> Self {
        Self { controller }
    }

    /// Controller behind the adapter.
    pub const fn controller(&self) -> &StatusController<W, M> {
        &self.controller
    }

    /// Returns the controller.
    pub fn into_controller(self) -> StatusController<W, M> {
        self.controller
    }
}

impl<W: Write, M: ErrorMetrics> StatusQueue for InlineStatusQueue<W, M> {
    fn put(&mut self, event: StatusEvent) -> Result<(), StatusError> {
        self.controller.call(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatusConfig;
    use crate::controller::ControllerPhase;
    use crate::time::Timestamp;

    #[test]
    fn forwards_events_on_the_calling_thread() {
        let config = StatusConfig::unthrottled().with_fixed_time(Timestamp::ZERO);
        let mut queue = InlineStatusQueue::new(StatusController::new(config, Vec::new()));

        queue
            .put(StatusEvent::metadata_done(Timestamp::from_secs(1)))
            .expect("vec output");
        assert_eq!(queue.controller().phase(), ControllerPhase::MetadataActive);

        queue.finish().expect("vec output");
        let controller = queue.into_controller();
        assert!(controller.is_finished());
        assert!(controller.output().ends_with(b"\n"));
    }
}
