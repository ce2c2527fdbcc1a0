use serde::Serialize;

use crate::timecode::TimeCode;

/// One recognized span of speech, numbered in the order it was observed.
///
/// `index` is 1-based and strictly increasing within a run. Timing is passed through as the
/// recognizer reported it; `end < start` and overlaps with the previous segment are accepted.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: u32,
    pub start: TimeCode,
    pub end: TimeCode,
    pub text: String,
}
