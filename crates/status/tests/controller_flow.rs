//! End-to-end event sequences through the controller.

use std::time::Duration;

use status::{
    ControllerPhase, EstimationSource, FileEvent, FileKind, InlineStatusQueue, ProducerEstimate,
    ProgressEvent, SeekAheadEstimate, StatusConfig, StatusController, StatusEvent, StatusQueue,
    Timestamp,
};

fn at(seconds: u64) -> Timestamp {
    Timestamp::from_secs(seconds)
}

fn lines(output: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(output)
        .split_inclusive(['\r', '\n'])
        .map(str::to_owned)
        .collect()
}

#[test]
fn metadata_job_ends_on_final_producer_total() {
    let config = StatusConfig::unthrottled().with_fixed_time(at(0));
    let mut queue = InlineStatusQueue::new(StatusController::new(config, Vec::new()));

    queue.put(ProducerEstimate::running(at(0), 2, None).into()).expect("put");
    queue.put(StatusEvent::metadata_done(at(1))).expect("put");
    queue.put(ProducerEstimate::finished(at(1), 3, None).into()).expect("put");
    queue.put(StatusEvent::metadata_done(at(2))).expect("put");
    queue.put(StatusEvent::metadata_done(at(3))).expect("put");
    queue.finish().expect("finish");

    let controller = queue.into_controller();
    assert_eq!(controller.phase(), ControllerPhase::MetadataActive);
    let output = lines(controller.output());
    let last = output.last().expect("at least one line");
    assert!(last.ends_with('\n'));
    assert_eq!(
        last.trim_end(),
        "/ [3/3 objects] 100% Done 1.00 objects/s ETA 00:00:00"
    );
    assert_eq!(last.len(), 80);
    assert!(output[..output.len() - 1].iter().all(|line| line.ends_with('\r')));
}

#[test]
fn resumed_download_reports_all_bytes() {
    let config = StatusConfig::unthrottled()
        .with_fixed_time(at(0))
        .with_spinner_interval(Duration::from_secs(3_600));
    let mut controller = StatusController::new(config, Vec::new());
    let events: Vec<StatusEvent> = vec![
        SeekAheadEstimate::new(at(0), 1, Some(1_024)).into(),
        FileEvent::started(at(1), FileKind::Download, "gs://bucket/obj", 1_024).into(),
        FileEvent::started(at(1), FileKind::ExistingComponent, "gs://bucket/obj", 512)
            .with_component(0, "obj_.gstmp")
            .into(),
        FileEvent::started(at(1), FileKind::ComponentToDownload, "gs://bucket/obj", 512)
            .with_component(1, "obj_.gstmp")
            .with_bytes_already_done(128)
            .into(),
        ProgressEvent::new(at(2), "gs://bucket/obj", 256)
            .with_component(1, "obj_.gstmp")
            .into(),
        FileEvent::finished(at(3), FileKind::ComponentToDownload, "gs://bucket/obj", 512)
            .with_component(1, "obj_.gstmp")
            .into(),
        FileEvent::finished(at(3), FileKind::Download, "gs://bucket/obj", 1_024).into(),
        StatusEvent::NoMoreWork,
    ];
    for event in events {
        controller.call(Some(event)).expect("vec output");
    }

    let snapshot = controller.snapshot().expect("data strategy");
    assert_eq!(snapshot.total_progress, 1_024);
    assert_eq!(snapshot.existing_progress, 640);
    assert_eq!(snapshot.new_progress, 384);
    assert_eq!(snapshot.total_size_source, EstimationSource::SeekAhead);

    let output = lines(controller.output());
    assert_eq!(output[0], "Estimated work for this command: objects: 1, total size: 1.00 KiB\n");
    let last = output.last().expect("final line");
    assert!(last.starts_with("| [1/1 files][  1.0 KiB/  1.0 KiB] 100% Done"), "{last:?}");
    assert!(last.ends_with('\n'));
}

#[test]
fn spinner_moves_between_progress_lines() {
    let config = StatusConfig::default()
        .with_fixed_time(at(0))
        .with_print_interval(Duration::from_secs(10))
        .with_spinner_interval(Duration::from_millis(600));
    let mut controller = StatusController::new(config, Vec::new());

    controller
        .call(Some(FileEvent::started(at(0), FileKind::Upload, "a", 4_096).into()))
        .expect("vec output");
    let after_start = controller.output().len();
    controller
        .call(Some(ProgressEvent::new(at(1), "a", 1_024).into()))
        .expect("vec output");

    assert_eq!(&controller.output()[after_start..], b"-\r");
}

#[test]
fn zero_item_job_still_summarizes() {
    let mut controller = StatusController::new(
        StatusConfig::default().with_fixed_time(at(0)),
        Vec::new(),
    );
    controller.call(None).expect("timeout");
    controller.call(Some(StatusEvent::NoMoreWork)).expect("sentinel");

    assert_eq!(controller.phase(), ControllerPhase::DataActive);
    let output = lines(controller.output());
    assert_eq!(output.len(), 1);
    assert!(output[0].ends_with('\n'));
}

#[test]
fn self_backed_totals_hide_throughput() {
    let config = StatusConfig::unthrottled()
        .with_fixed_time(at(0))
        .with_spinner_interval(Duration::from_secs(3_600));
    let mut controller = StatusController::new(config, Vec::new());
    controller
        .call(Some(FileEvent::started(at(1), FileKind::Upload, "a", 100).into()))
        .expect("vec output");
    controller
        .call(Some(ProgressEvent::new(at(2), "a", 50).into()))
        .expect("vec output");

    let output = lines(controller.output());
    let last = output.last().expect("progress line");
    assert!(last.trim_end().ends_with("[   50.0 B/  100.0 B]"), "{last:?}");
    assert!(!last.contains("B/s"));
}

#[test]
fn producer_estimate_shows_throughput() {
    let config = StatusConfig::unthrottled()
        .with_fixed_time(at(0))
        .with_spinner_interval(Duration::from_secs(3_600));
    let mut controller = StatusController::new(config, Vec::new());
    controller
        .call(Some(ProducerEstimate::running(at(0), 1, Some(100)).into()))
        .expect("vec output");
    controller
        .call(Some(FileEvent::started(at(1), FileKind::Upload, "a", 100).into()))
        .expect("vec output");
    controller
        .call(Some(ProgressEvent::new(at(2), "a", 50).into()))
        .expect("vec output");

    let output = lines(controller.output());
    let last = output.last().expect("progress line");
    assert!(last.contains("25.0 B/s ETA 00:00:02"), "{last:?}");
}

#[test]
fn sentinel_finalizes_without_final_total() {
    let config = StatusConfig::unthrottled()
        .with_fixed_time(at(0))
        .with_spinner_interval(Duration::from_secs(3_600));
    let mut controller = StatusController::new(config, Vec::new());
    controller
        .call(Some(FileEvent::started(at(1), FileKind::Upload, "a", 10).into()))
        .expect("vec output");
    controller
        .call(Some(FileEvent::finished(at(2), FileKind::Upload, "a", 10).into()))
        .expect("vec output");
    assert!(!controller.is_finished());
    controller.call(Some(StatusEvent::NoMoreWork)).expect("sentinel");

    assert!(controller.is_finished());
    let output = lines(controller.output());
    assert_eq!(output.iter().filter(|line| line.ends_with('\n')).count(), 1);
    let last = output.last().expect("final line");
    assert!(last.contains("[1 files][   10.0 B/   10.0 B]"), "{last:?}");
    assert!(last.ends_with('\n'));
    assert!(output[..output.len() - 1].iter().all(|line| line.ends_with('\r')));

    controller
        .call(Some(FileEvent::started(at(3), FileKind::Upload, "b", 10).into()))
        .expect("vec output");
    assert_eq!(lines(controller.output()).len(), output.len());
}
