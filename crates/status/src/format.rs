//! Text formatting for progress lines.
//!
//! Byte counts use binary units (`KiB`, `MiB`, ...) with a fixed-width
//! rendering so the progress line does not jitter as values grow. Object
//! counts use thousands separators and remaining time is shown as
//! `HH:MM:SS`.
//!
//! # Example
//!
//! ```
//! use status::format::{fixed_width_bytes, format_count, format_eta};
//!
//! assert_eq!(fixed_width_bytes(0.0), "    0.0 B");
//! assert_eq!(fixed_width_bytes(1_000.0), "   1000 B");
//! assert_eq!(format_count(1_234_567), "1,234,567");
//! assert_eq!(format_eta(3_725.0), "01:02:05");
//! ```

/// Width of the field produced by [`fixed_width_bytes`].
pub const FIXED_BYTES_WIDTH: usize = 9;

const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Formats `bytes` with a binary unit and `decimal_places` fractional digits.
///
/// # Example
///
/// ```
/// use status::format::human_readable;
///
/// assert_eq!(human_readable(1_536.0, 2), "1.50 KiB");
/// assert_eq!(human_readable(0.0, 1), "0.0 B");
/// ```
#[must_use]
pub fn human_readable(bytes: f64, decimal_places: usize) -> String {
    let bytes = if bytes.is_finite() && bytes > 0.0 { bytes } else { 0.0 };
    let exponent = if bytes < 1.0 {
        0
    } else {
        ((bytes.log2() / 10.0).floor() as usize).min(UNITS.len() - 1)
    };
    let scaled = bytes / 2_f64.powi((exponent * 10) as i32);
    format!("{scaled:.decimal_places$} {}", UNITS[exponent])
}

/// Formats `bytes` with one decimal place in a field of
/// [`FIXED_BYTES_WIDTH`] characters.
///
/// When the rounded whole part reaches 1000 the fraction and decimal point
/// are dropped: a unit never holds more than four integer digits before it
/// rolls over, so the result always fits the field.
#[must_use]
pub fn fixed_width_bytes(bytes: f64) -> String {
    const DECIMAL_PLACES: usize = 1;

    let readable = human_readable(bytes, DECIMAL_PLACES);
    let (number, unit) = readable.split_once(' ').unwrap_or((readable.as_str(), ""));
    let whole = number.parse::<f64>().map_or(0.0, f64::round);
    let number = if whole >= 1000.0 {
        number.split_once('.').map_or(number, |(integer, _)| integer)
    } else {
        number
    };

    format!("{:>width$}", format!("{number} {unit}"), width = FIXED_BYTES_WIDTH)
}

/// Formats a count with thousands separators (commas).
///
/// # Example
///
/// ```
/// use status::format::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234), "1,234");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }

    result
}

/// Formats remaining seconds as `HH:MM:SS`.
///
/// Anything at or beyond 100 hours is shown as `N+ hrs`, capped at 999.
#[must_use]
pub fn format_eta(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    let hours = seconds / 3_600;
    if hours >= 100 {
        return format!("{}+ hrs", hours.min(999));
    }
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats `done / total` as a right-aligned whole percentage.
///
/// A zero total counts as complete. The value is capped at 100.
#[must_use]
pub fn format_percent(done: u64, total: u64) -> String {
    let percent = if total == 0 {
        100
    } else {
        ((done.min(total) as f64 / total as f64) * 100.0) as u64
    };
    format!("{percent:>3}% Done")
}
