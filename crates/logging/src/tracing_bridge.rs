//! crates/logging/src/tracing_bridge.rs
//! Subscriber setup bridging `-v` verbosity to `tracing` filters.
//!
//! Diagnostics share standard error with the in-place progress line, so the
//! subscriber writes without ANSI colour and keeps the default fmt layout.
//!
//! # Usage
//!
//! ```rust,ignore
//! use logging::{VerbosityLevel, init_tracing};
//!
//! init_tracing(VerbosityLevel::from_verbose_count(2));
//! logging::trace_strategy!("switched to data strategy");
//! ```

use super::verbosity::VerbosityLevel;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::TryInitError;

/// Environment variable that overrides the verbosity-derived filter.
pub const LOG_ENV_VAR: &str = "XFERSTAT_LOG";

/// Builds the filter for `level`, preferring [`LOG_ENV_VAR`] when it parses.
#[must_use]
pub fn build_filter(level: VerbosityLevel) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(level.directive()))
}

/// Installs the global subscriber, reporting an error if one already exists.
pub fn try_init_tracing(level: VerbosityLevel) -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(fmt_layer)
        .try_init()
}

/// Installs the global subscriber, ignoring a subscriber installed earlier.
///
/// Tests and embedding applications commonly install their own subscriber
/// first; in that case the existing one is kept.
pub fn init_tracing(level: VerbosityLevel) {
    let _ = try_init_tracing(level);
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .map_err(|_| io::Error::other("poisoned"))?
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(level: VerbosityLevel, emit: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(level.directive()))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_target(true)
            .finish();
        tracing::subscriber::with_default(subscriber, emit);
        let bytes = captured.0.lock().expect("lock").clone();
        String::from_utf8(bytes).expect("utf-8 log")
    }

    #[test]
    fn macros_log_under_shared_targets() {
        let output = capture(VerbosityLevel::Trace, || {
            crate::trace_estimate!("estimate adopted");
            crate::trace_accounting!("bytes folded");
            crate::warn_consumer!("sender dropped");
        });
        assert!(output.contains(crate::targets::ESTIMATE), "{output}");
        assert!(output.contains(crate::targets::ACCOUNTING), "{output}");
        assert!(output.contains(crate::targets::CONSUMER), "{output}");
    }

    #[test]
    fn quiet_level_keeps_consumer_warnings() {
        let output = capture(VerbosityLevel::Quiet, || {
            crate::trace_consumer!("consumer started");
            crate::warn_consumer!("sender dropped");
        });
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("sender dropped"));
        assert!(!output.contains("consumer started"));
    }

    #[test]
    fn filter_uses_level_directive_without_override() {
        if std::env::var_os(LOG_ENV_VAR).is_some() {
            return;
        }
        let filter = build_filter(VerbosityLevel::Debug);
        assert_eq!(filter.to_string(), EnvFilter::new("warn,xferstat=debug").to_string());
    }

    #[test]
    fn repeated_initialisation_is_harmless() {
        init_tracing(VerbosityLevel::Quiet);
        init_tracing(VerbosityLevel::Trace);
        assert!(try_init_tracing(VerbosityLevel::Quiet).is_err());
    }
}
