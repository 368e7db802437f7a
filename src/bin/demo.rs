use std::ffi::OsString;
use std::io::Write;
use std::panic;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::{Arg, ArgAction, ArgMatches, Command};
use logging::VerbosityLevel;
use status::format::{format_count, human_readable};
use status::{
    ConsumerConfig, ProgressSnapshot, RetryableErrorCounts, StatusConfig, StatusController,
    StatusError, Strategy,
};

use crate::simulate::{self, Workload};

/// Name reported in usage text and diagnostics.
pub const PROGRAM_NAME: &str = "xferstat-demo";

/// Parsed command line.
#[derive(Clone, Debug)]
struct Options {
    workload: Workload,
    status: StatusConfig,
    poll_timeout: Duration,
    verbosity: VerbosityLevel,
}

fn millis(name: &'static str, default: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("MS")
        .help(help)
        .num_args(1)
        .action(ArgAction::Set)
        .default_value(default)
        .value_parser(clap::value_parser!(u64))
}

/// Builds the `clap` command used for parsing.
fn command() -> Command {
    Command::new(PROGRAM_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Drives a simulated parallel transfer through the status aggregator.")
        .arg(
            Arg::new("workers")
                .short('j')
                .long("workers")
                .value_name("N")
                .help("Number of worker threads moving objects.")
                .default_value("4")
                .value_parser(clap::value_parser!(u16).range(1..)),
        )
        .arg(
            Arg::new("files")
                .long("files")
                .value_name("N")
                .help("Number of objects in the job.")
                .default_value("32")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("file-size")
                .long("file-size")
                .value_name("BYTES")
                .help("Size of each object.")
                .default_value("1048576")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("components")
                .long("components")
                .value_name("N")
                .help("Split each object into N components; 0 moves whole objects.")
                .default_value("0")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("chunks")
                .long("chunks")
                .value_name("N")
                .help("Progress reports per object or component.")
                .default_value("8")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(millis(
            "delay-ms",
            "0",
            "Pause before each progress report.",
        ))
        .arg(
            Arg::new("metadata")
                .long("metadata")
                .help("Simulate a metadata-only command that counts objects.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("seek-ahead")
                .long("seek-ahead")
                .help("Announce the job size before any work starts.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("error-every")
                .long("error-every")
                .value_name("N")
                .help("Report a retryable error for every N-th object.")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(millis(
            "print-interval-ms",
            "1000",
            "Minimum time between progress lines.",
        ))
        .arg(millis(
            "spinner-interval-ms",
            "600",
            "Minimum time between spinner updates.",
        ))
        .arg(millis(
            "throughput-interval-ms",
            "5000",
            "Minimum window for a throughput sample.",
        ))
        .arg(millis(
            "throughput-latency-ms",
            "10000",
            "Time after start before throughput and ETA are shown.",
        ))
        .arg(millis(
            "poll-ms",
            "1000",
            "Longest consumer wait before the line is refreshed; 0 waits for events.",
        ))
        .arg(
            Arg::new("width")
                .long("width")
                .value_name("COLUMNS")
                .help("Console width used to pad progress lines.")
                .default_value("80")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase diagnostic verbosity; repeat for more detail.")
                .action(ArgAction::Count),
        )
}

fn duration(matches: &ArgMatches, id: &str) -> Duration {
    Duration::from_millis(matches.get_one::<u64>(id).copied().unwrap_or_default())
}

fn options_from(matches: &ArgMatches) -> Options {
    let verbosity = VerbosityLevel::from_verbose_count(matches.get_count("verbose"));
    let workload = Workload {
        workers: usize::from(matches.get_one::<u16>("workers").copied().unwrap_or(1)),
        files: matches.get_one::<u64>("files").copied().unwrap_or_default(),
        file_size: matches.get_one::<u64>("file-size").copied().unwrap_or_default(),
        components: matches.get_one::<u32>("components").copied().unwrap_or_default(),
        chunks: matches.get_one::<u32>("chunks").copied().unwrap_or(1),
        chunk_delay: duration(matches, "delay-ms"),
        metadata_only: matches.get_flag("metadata"),
        seek_ahead: matches.get_flag("seek-ahead"),
        error_every: matches.get_one::<u64>("error-every").copied(),
    };
    let status = StatusConfig::new()
        .with_print_interval(duration(matches, "print-interval-ms"))
        .with_spinner_interval(duration(matches, "spinner-interval-ms"))
        .with_throughput_interval(duration(matches, "throughput-interval-ms"))
        .with_throughput_latency(duration(matches, "throughput-latency-ms"))
        .with_console_width(matches.get_one::<usize>("width").copied().unwrap_or(80))
        .with_verbose(verbosity.is_verbose());

    Options {
        workload,
        status,
        poll_timeout: duration(matches, "poll-ms"),
        verbosity,
    }
}

/// Parses `args`, runs the simulated job and prints a summary.
///
/// Progress lines go to `stderr` and the summary to `stdout`, so the summary
/// survives redirecting the live display away.
#[must_use]
pub fn run_with<I, Out, Err>(args: I, stdout: &mut Out, stderr: &mut Err) -> ExitCode
where
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
    Out: Write,
    Err: Write,
{
    let matches = match command().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(error) => {
            let rendered = error.render().to_string();
            return if error.use_stderr() {
                let _ = write!(stderr, "{rendered}");
                ExitCode::FAILURE
            } else {
                let _ = write!(stdout, "{rendered}");
                ExitCode::SUCCESS
            };
        }
    };

    let options = options_from(&matches);
    logging::init_tracing(options.verbosity);

    let outcome = run(&options, stderr);
    let written = outcome.and_then(|(snapshot, metrics)| {
        write_summary(stdout, snapshot.as_ref(), &metrics).map_err(StatusError::from)
    });
    match written {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "{PROGRAM_NAME}: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run<Err: Write>(
    options: &Options,
    stderr: &mut Err,
) -> Result<(Option<ProgressSnapshot>, RetryableErrorCounts), StatusError> {
    let mut controller = StatusController::new(options.status.clone(), &mut *stderr);
    let consumer = ConsumerConfig::default().with_poll_timeout(options.poll_timeout);
    let (sender, receiver) = status::channel(&consumer);
    let workload = &options.workload;
    tracing::info!(
        target: logging::targets::DEMO,
        workers = workload.workers,
        files = workload.files,
        file_size = workload.file_size,
        metadata = workload.metadata_only,
        "starting simulated job"
    );

    let produced = thread::scope(|scope| {
        let producer = scope.spawn(move || {
            let result = simulate::run(workload, &sender);
            let finished = sender.finish();
            result.and(finished)
        });
        status::run_consumer(&mut controller, &receiver);
        producer
            .join()
            .unwrap_or_else(|payload| panic::resume_unwind(payload))
    });

    let snapshot = controller.snapshot();
    let (_, metrics) = controller.into_parts();
    produced.map(|()| (snapshot, metrics))
}

fn write_summary<Out: Write>(
    stdout: &mut Out,
    snapshot: Option<&ProgressSnapshot>,
    metrics: &RetryableErrorCounts,
) -> std::io::Result<()> {
    if let Some(snapshot) = snapshot {
        match snapshot.strategy {
            Strategy::Metadata => {
                writeln!(stdout, "objects finished: {}", format_count(snapshot.objects_finished))?;
            }
            Strategy::Data => {
                writeln!(
                    stdout,
                    "files finished: {}, bytes: {} ({} new, {} resumed)",
                    format_count(snapshot.objects_finished),
                    human_readable(snapshot.total_progress as f64, 2),
                    human_readable(snapshot.new_progress as f64, 2),
                    human_readable(snapshot.existing_progress as f64, 2),
                )?;
            }
        }
    }

    if metrics.is_empty() {
        writeln!(stdout, "retryable errors: none")
    } else {
        let by_type: Vec<String> = metrics
            .sorted()
            .into_iter()
            .map(|(error_type, count)| format!("{error_type}: {count}"))
            .collect();
        writeln!(
            stdout,
            "retryable errors: {} ({})",
            metrics.total(),
            by_type.join(", ")
        )
    }
}
