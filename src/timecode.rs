//! Subtitle time codes (`HH:MM:SS,mmm`).
//!
//! The recognizer reports segment boundaries as `minutes:seconds.millis` pairs; subtitle files
//! want an hour-based, comma-separated rendering. `TimeCode` sits in between as a plain
//! millisecond count so conversion and rendering stay separate.

use std::fmt;

use serde::{Serialize, Serializer};

/// Elapsed time at millisecond precision.
///
/// Hours are unbounded: a time code past 24h renders as `25:00:00,000`, never wraps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeCode {
    millis: u64,
}

impl TimeCode {
    /// Build a time code from a minutes count plus a `seconds.millis` remainder.
    ///
    /// Inputs must be non-negative and finite.
    pub fn from_parts(minutes: f64, seconds_with_millis: f64) -> Self {
        Self::from_seconds(minutes * 60.0 + seconds_with_millis)
    }

    /// Build a time code from a plain duration in seconds.
    ///
    /// Rounding policy:
    /// - We round to the nearest millisecond over the *total* duration so a fraction like
    ///   `.9996` carries into the next second instead of rendering a four-digit millis field.
    pub fn from_seconds(seconds: f64) -> Self {
        debug_assert!(
            seconds.is_finite() && seconds >= 0.0,
            "time code input must be non-negative and finite, got {seconds}"
        );

        // Float-to-int casts saturate, so out-of-contract input degrades to 0 or u64::MAX.
        let millis = (seconds * 1000.0).round() as u64;
        Self { millis }
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    pub const fn as_millis(&self) -> u64 {
        self.millis
    }

    /// Render as `HH:MM:SS,mmm`.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.millis % 1000;
        let total_s = self.millis / 1000;

        let s = total_s % 60;
        let total_m = total_s / 60;

        let m = total_m % 60;
        let h = total_m / 60;

        write!(f, "{h:02}:{m:02}:{s:02},{ms:03}")
    }
}

impl Serialize for TimeCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
