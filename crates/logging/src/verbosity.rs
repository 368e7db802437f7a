//! crates/logging/src/verbosity.rs
//! Verbosity levels derived from repeated `-v` flags.

/// Diagnostic verbosity selected on the command line.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VerbosityLevel {
    /// Warnings and errors only.
    #[default]
    Quiet,
    /// Lifecycle messages (`-v`).
    Verbose,
    /// Strategy and estimate decisions (`-vv`).
    Debug,
    /// Per-event accounting (`-vvv` and beyond).
    Trace,
}

impl VerbosityLevel {
    /// Maps a count of `-v` flags to a level, saturating at [`Self::Trace`].
    #[must_use]
    pub const fn from_verbose_count(count: u8) -> Self {
        match count {
            0 => Self::Quiet,
            1 => Self::Verbose,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// Returns the `EnvFilter` directive for this level.
    #[must_use]
    pub const fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Verbose => "warn,xferstat=info",
            Self::Debug => "warn,xferstat=debug",
            Self::Trace => "warn,xferstat=trace",
        }
    }

    /// Reports whether retryable errors should be surfaced at warning level.
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        !matches!(self, Self::Quiet)
    }
}
