//! crates/logging/src/tracing_macros.rs
//! Convenience macros for xferstat-specific tracing.
//!
//! These macros provide ergonomic wrappers around standard tracing macros
//! with the targets listed in [`crate::targets`]. Callers must depend on
//! `tracing` themselves.

/// Emit an estimate adoption trace.
///
/// # Example
/// ```ignore
/// trace_estimate!("adopted {} objects from {:?}", count, source);
/// ```
#[macro_export]
macro_rules! trace_estimate {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: $crate::targets::ESTIMATE, $($arg)*);
    };
}

/// Emit a strategy selection trace.
///
/// # Example
/// ```ignore
/// trace_strategy!("replacing metadata strategy with data strategy");
/// ```
#[macro_export]
macro_rules! trace_strategy {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: $crate::targets::STRATEGY, $($arg)*);
    };
}

/// Emit a throughput sampling trace.
///
/// # Example
/// ```ignore
/// trace_throughput!("sampled {:.2} B/s", rate);
/// ```
#[macro_export]
macro_rules! trace_throughput {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: $crate::targets::THROUGHPUT, $($arg)*);
    };
}

/// Emit a byte accounting trace.
///
/// # Example
/// ```ignore
/// trace_accounting!("file {} finished with {} unaccounted bytes", name, bytes);
/// ```
#[macro_export]
macro_rules! trace_accounting {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: $crate::targets::ACCOUNTING, $($arg)*);
    };
}

/// Emit a retryable error trace at debug level.
///
/// Use [`warn_retry!`](crate::warn_retry) when the operator asked for
/// verbose output.
///
/// # Example
/// ```ignore
/// trace_retry!("retryable error: {}", error_type);
/// ```
#[macro_export]
macro_rules! trace_retry {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: $crate::targets::RETRY, $($arg)*);
    };
}

/// Emit a retryable error at warning level.
///
/// # Example
/// ```ignore
/// warn_retry!("retryable error: {}", error_type);
/// ```
#[macro_export]
macro_rules! warn_retry {
    ($($arg:tt)*) => {
        ::tracing::warn!(target: $crate::targets::RETRY, $($arg)*);
    };
}

/// Emit a consumer lifecycle trace.
///
/// # Example
/// ```ignore
/// trace_consumer!("consumer drained {} events", count);
/// ```
#[macro_export]
macro_rules! trace_consumer {
    ($($arg:tt)*) => {
        ::tracing::info!(target: $crate::targets::CONSUMER, $($arg)*);
    };
}

/// Emit a consumer problem at warning level.
///
/// # Example
/// ```ignore
/// warn_consumer!(%error, "status event dropped");
/// ```
#[macro_export]
macro_rules! warn_consumer {
    ($($arg:tt)*) => {
        ::tracing::warn!(target: $crate::targets::CONSUMER, $($arg)*);
    };
}
