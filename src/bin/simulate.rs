//! Simulated transfer workload.
//!
//! A listing loop hands object indices to a pool of worker threads over a
//! crossbeam channel and reports running estimates as it goes. Workers emit
//! the same events a real transfer would: file and component start/finish,
//! chunked progress, metadata completions and the odd retryable error.

use std::panic;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use status::{
    FileEvent, FileKind, ProducerEstimate, ProgressEvent, RetryableError, SeekAheadEstimate,
    StatusError, StatusEvent, StatusSender, Timestamp,
};

/// Objects listed between two running estimates.
const ESTIMATE_EVERY: u64 = 8;

/// Error type reported for injected failures.
pub const SIMULATED_ERROR: &str = "SimulatedThrottle";

/// Shape of the simulated job.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Workload {
    /// Worker threads moving objects.
    pub workers: usize,
    /// Objects in the job.
    pub files: u64,
    /// Size of each object.
    pub file_size: u64,
    /// Components per object; zero moves whole objects.
    pub components: u32,
    /// Progress reports per object or component.
    pub chunks: u32,
    /// Pause before each progress report.
    pub chunk_delay: Duration,
    /// Emit metadata completions instead of data events.
    pub metadata_only: bool,
    /// Announce the job size up front.
    pub seek_ahead: bool,
    /// Report a retryable error for every n-th object.
    pub error_every: Option<u64>,
}

impl Workload {
    fn size_of(&self, objects: u64) -> Option<u64> {
        if self.metadata_only {
            None
        } else {
            Some(objects.saturating_mul(self.file_size))
        }
    }
}

/// Runs the workload to completion, sending every event through `sender`.
///
/// The end-of-work sentinel is left to the caller.
pub fn run(workload: &Workload, sender: &StatusSender) -> Result<(), StatusError> {
    if workload.seek_ahead {
        sender.send(SeekAheadEstimate::new(
            Timestamp::now(),
            workload.files,
            workload.size_of(workload.files),
        ))?;
    }

    let (jobs_tx, jobs_rx) = crossbeam_channel::bounded::<u64>(workload.workers.max(1));
    thread::scope(|scope| {
        let workers: Vec<_> = (0..workload.workers.max(1))
            .map(|_| {
                let jobs = jobs_rx.clone();
                let sender = sender.clone();
                scope.spawn(move || work(workload, &jobs, &sender))
            })
            .collect();
        drop(jobs_rx);

        let listed = list(workload, jobs_tx, sender);
        workers
            .into_iter()
            .map(|worker| worker.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
            .fold(listed, Result::and)
    })
}

fn list(workload: &Workload, jobs: Sender<u64>, sender: &StatusSender) -> Result<(), StatusError> {
    for index in 0..workload.files {
        if jobs.send(index).is_err() {
            break;
        }
        let listed = index + 1;
        if listed % ESTIMATE_EVERY == 0 && listed < workload.files {
            sender.send(ProducerEstimate::running(
                Timestamp::now(),
                listed,
                workload.size_of(listed),
            ))?;
        }
    }
    drop(jobs);
    sender.send(ProducerEstimate::finished(
        Timestamp::now(),
        workload.files,
        workload.size_of(workload.files),
    ))
}

fn work(
    workload: &Workload,
    jobs: &Receiver<u64>,
    sender: &StatusSender,
) -> Result<(), StatusError> {
    for index in jobs {
        if let Some(every) = workload.error_every.filter(|every| *every > 0)
            && (index + 1) % every == 0
        {
            sender.send(RetryableError::new(Timestamp::now(), SIMULATED_ERROR))?;
        }

        if workload.metadata_only {
            pause(workload);
            sender.send(StatusEvent::metadata_done(Timestamp::now()))?;
        } else {
            transfer(workload, index, sender)?;
        }
    }
    Ok(())
}

fn transfer(workload: &Workload, index: u64, sender: &StatusSender) -> Result<(), StatusError> {
    let src = format!("file://demo/object-{index:05}");
    let dst = format!("gs://demo-bucket/object-{index:05}");
    let size = workload.file_size;
    sender.send(
        FileEvent::started(Timestamp::now(), FileKind::Upload, src.as_str(), size)
            .with_dst(dst.as_str()),
    )?;

    if workload.components == 0 {
        report_chunks(workload, sender, size, |bytes| {
            ProgressEvent::new(Timestamp::now(), src.as_str(), bytes).with_dst(dst.as_str())
        })?;
    } else {
        let count = u64::from(workload.components);
        let part = size / count;
        for component in 0..workload.components {
            let component_size = if u64::from(component) + 1 == count {
                size - part * (count - 1)
            } else {
                part
            };
            let part_dst = format!("{dst}_.part{component}");

            sender.send(
                FileEvent::started(
                    Timestamp::now(),
                    FileKind::ComponentToUpload,
                    src.as_str(),
                    component_size,
                )
                .with_component(component, part_dst.as_str()),
            )?;
            report_chunks(workload, sender, component_size, |bytes| {
                ProgressEvent::new(Timestamp::now(), src.as_str(), bytes)
                    .with_component(component, part_dst.as_str())
            })?;
            sender.send(
                FileEvent::finished(
                    Timestamp::now(),
                    FileKind::ComponentToUpload,
                    src.as_str(),
                    component_size,
                )
                .with_component(component, part_dst.as_str()),
            )?;
        }
    }

    sender.send(FileEvent::finished(Timestamp::now(), FileKind::Upload, src, size).with_dst(dst))
}

fn report_chunks(
    workload: &Workload,
    sender: &StatusSender,
    size: u64,
    progress: impl Fn(u64) -> ProgressEvent,
) -> Result<(), StatusError> {
    let chunks = u64::from(workload.chunks.max(1));
    for step in 1..=chunks {
        pause(workload);
        sender.send(progress(size * step / chunks))?;
    }
    Ok(())
}

fn pause(workload: &Workload) {
    if !workload.chunk_delay.is_zero() {
        thread::sleep(workload.chunk_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use status::{ConsumerConfig, StatusConfig, StatusController, channel, run_consumer};

    fn workload() -> Workload {
        Workload {
            workers: 3,
            files: 10,
            file_size: 1_000,
            components: 0,
            chunks: 4,
            chunk_delay: Duration::ZERO,
            metadata_only: false,
            seek_ahead: false,
            error_every: None,
        }
    }

    fn drive(workload: &Workload) -> StatusController<Vec<u8>> {
        let mut controller = StatusController::new(StatusConfig::unthrottled(), Vec::new());
        let (sender, receiver) = channel(&ConsumerConfig::default());
        thread::scope(|scope| {
            scope.spawn(move || {
                run(workload, &sender).expect("consumer is running");
                sender.finish().expect("consumer is running");
            });
            run_consumer(&mut controller, &receiver);
        });
        controller
    }

    #[test]
    fn whole_objects_account_for_every_byte() {
        let controller = drive(&workload());
        let snapshot = controller.snapshot().expect("data strategy");
        assert_eq!(snapshot.objects_finished, 10);
        assert_eq!(snapshot.total_progress, 10_000);
        assert_eq!(snapshot.num_objects, 10);
        assert!(controller.is_finished());
    }

    #[test]
    fn components_split_uneven_sizes() {
        let workload = Workload {
            components: 3,
            file_size: 1_001,
            files: 2,
            ..workload()
        };
        let controller = drive(&workload);
        let snapshot = controller.snapshot().expect("data strategy");
        assert_eq!(snapshot.total_progress, 2_002);
        assert_eq!(snapshot.components_started, 6);
        assert_eq!(snapshot.components_finished, 6);
    }

    #[test]
    fn metadata_jobs_report_errors() {
        let workload = Workload {
            metadata_only: true,
            error_every: Some(5),
            ..workload()
        };
        let controller = drive(&workload);
        assert_eq!(controller.metrics().count(SIMULATED_ERROR), 2);
        let snapshot = controller.snapshot().expect("metadata strategy");
        assert_eq!(snapshot.objects_finished, 10);
    }
}
