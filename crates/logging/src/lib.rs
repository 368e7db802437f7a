#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` provides the diagnostic plumbing shared across the xferstat
//! workspace. Progress lines are written to an injected writer by the
//! `status` crate; everything else (strategy changes, estimate adoption,
//! retryable errors, consumer lifecycle) flows through the [`tracing`] crate
//! under a fixed set of targets so operators can filter each subsystem
//! independently.
//!
//! # Design
//!
//! - [`VerbosityLevel`] maps the number of `-v` flags given on a command line
//!   to an [`EnvFilter`](tracing_subscriber::EnvFilter) directive.
//! - [`init_tracing`] installs a formatting subscriber on standard error. The
//!   `XFERSTAT_LOG` environment variable overrides the verbosity-derived
//!   directive.
//! - The `trace_*!` macros wrap the standard tracing macros with the targets
//!   listed in [`targets`].
//!
//! # Examples
//!
//! ```
//! use logging::VerbosityLevel;
//!
//! assert_eq!(VerbosityLevel::from_verbose_count(0), VerbosityLevel::Quiet);
//! assert_eq!(VerbosityLevel::from_verbose_count(2).directive(), "warn,xferstat=debug");
//! ```

mod verbosity;

#[cfg(feature = "tracing")]
mod tracing_bridge;
mod tracing_macros;

pub use verbosity::VerbosityLevel;

#[cfg(feature = "tracing")]
#[cfg_attr(docsrs, doc(cfg(feature = "tracing")))]
pub use tracing_bridge::{LOG_ENV_VAR, build_filter, init_tracing, try_init_tracing};

/// Tracing targets used by the xferstat crates.
pub mod targets {
    /// Estimate adoption and rejection.
    pub const ESTIMATE: &str = "xferstat::estimate";
    /// Aggregation strategy selection and replacement.
    pub const STRATEGY: &str = "xferstat::strategy";
    /// Throughput sampling.
    pub const THROUGHPUT: &str = "xferstat::throughput";
    /// Retryable errors diverted to metrics.
    pub const RETRY: &str = "xferstat::retry";
    /// Consumer thread lifecycle.
    pub const CONSUMER: &str = "xferstat::consumer";
    /// Per-file byte accounting.
    pub const ACCOUNTING: &str = "xferstat::accounting";
    /// Demo driver lifecycle.
    pub const DEMO: &str = "xferstat::demo";
}
