//! Recognizer output lines that carry a timed speech segment.
//!
//! In verbose mode the recognizer prints one line per recognized segment:
//!
//! ```text
//! [0:05.250 --> 0:07.000] hello there
//! ```
//!
//! Everything else it prints (model loading, language detection, progress) is free-form and
//! only interesting as progress output.

use std::sync::LazyLock;

use regex::Regex;

use crate::timecode::TimeCode;

/// Substring every segment line contains. Lines without it are never parsed.
pub const SEGMENT_MARKER: &str = "-->";

static SEGMENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    // Captures: start minutes, start seconds.millis, end minutes, end seconds.millis, text.
    Regex::new(r"^\[(\d+):(\d{2}\.\d{3}) --> (\d+):(\d{2}\.\d{3})\](?: (.*))?$")
        .expect("segment line pattern is valid")
});

/// The raw timing and text of one recognized segment, as printed by the recognizer.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentLine {
    pub start_minutes: f64,
    pub start_seconds: f64,
    pub end_minutes: f64,
    pub end_seconds: f64,
    pub text: String,
}

impl SegmentLine {
    pub fn start(&self) -> TimeCode {
        TimeCode::from_parts(self.start_minutes, self.start_seconds)
    }

    pub fn end(&self) -> TimeCode {
        TimeCode::from_parts(self.end_minutes, self.end_seconds)
    }
}

/// Whether `line` looks like it might be a segment (cheap pre-check before parsing).
pub fn has_segment_marker(line: &str) -> bool {
    line.contains(SEGMENT_MARKER)
}

/// Parse one line of recognizer output.
///
/// Returns `None` for anything that is not a well-formed segment line; that is not an error.
/// A trailing line terminator (`\n` or `\r\n`) is ignored.
pub fn parse_segment_line(line: &str) -> Option<SegmentLine> {
    let line = line.trim_end_matches(['\r', '\n']);
    let caps = SEGMENT_LINE.captures(line)?;

    let seg = SegmentLine {
        start_minutes: caps[1].parse().ok()?,
        start_seconds: caps[2].parse().ok()?,
        end_minutes: caps[3].parse().ok()?,
        end_seconds: caps[4].parse().ok()?,
        text: caps.get(5).map_or("", |m| m.as_str()).to_owned(),
    };

    // A long enough minutes field overflows to infinity; such a line has no time code.
    let finite = |minutes: f64, seconds: f64| (minutes * 60.0 + seconds).is_finite();
    (finite(seg.start_minutes, seg.start_seconds) && finite(seg.end_minutes, seg.end_seconds))
        .then_some(seg)
}
