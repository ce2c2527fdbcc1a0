//! Progress notifications emitted while a run is live.
//!
//! The feed is advisory: it mirrors what the run is doing (every recognizer line, every
//! persisted segment, the terminal outcome) but the subtitle files remain the durable result.

use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc;

use serde::Serialize;

use crate::Result;
use crate::segments::Segment;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// The recognizer was launched with this command line.
    Started { command: String },

    /// Working files were opened.
    WorkingFiles { primary: PathBuf, secondary: PathBuf },

    /// One raw line of recognizer output, matching or not.
    Line { text: String },

    /// A segment was parsed and persisted to the primary working file.
    Segment(Segment),

    /// Final files were written.
    Completed {
        primary: PathBuf,
        secondary: PathBuf,
        segments: u32,
    },

    /// The run observed cancellation; working files were left as-is.
    Stopped { segments: u32 },

    /// The run failed; nothing further will be written.
    Failed { error: String },
}

impl RunEvent {
    /// Serialize as a single line of JSON (no trailing newline).
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEvent::Started { command } => write!(f, "Starting transcription: {command}"),
            RunEvent::WorkingFiles { primary, secondary } => write!(
                f,
                "Writing {} and {}",
                primary.display(),
                secondary.display()
            ),
            RunEvent::Line { text } => f.write_str(text),
            RunEvent::Segment(seg) => {
                write!(f, "#{} {} --> {} {}", seg.index, seg.start, seg.end, seg.text)
            }
            RunEvent::Completed {
                primary, segments, ..
            } => write!(
                f,
                "Transcription completed ({segments} segments). SRT file saved at {}",
                primary.display()
            ),
            RunEvent::Stopped { segments } => {
                write!(f, "Transcription stopped after {segments} segments.")
            }
            RunEvent::Failed { error } => write!(f, "Transcription failed: {error}"),
        }
    }
}

/// Receives the progress feed of a run.
///
/// Called on the run's worker thread, in the order events happen.
pub trait Observer: Send {
    fn on_event(&mut self, event: &RunEvent);
}

impl<F> Observer for F
where
    F: FnMut(&RunEvent) + Send,
{
    fn on_event(&mut self, event: &RunEvent) {
        self(event)
    }
}

/// Forwards a clone of every event. A dropped receiver is ignored; the run carries on.
impl Observer for mpsc::Sender<RunEvent> {
    fn on_event(&mut self, event: &RunEvent) {
        let _ = self.send(event.clone());
    }
}

/// Discards the feed.
impl Observer for () {
    fn on_event(&mut self, _event: &RunEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timecode::TimeCode;

    #[test]
    fn closures_are_observers() {
        let mut seen = Vec::new();
        {
            let mut observer = |event: &RunEvent| seen.push(event.to_string());
            observer.on_event(&RunEvent::Stopped { segments: 2 });
        }
        assert_eq!(seen, vec!["Transcription stopped after 2 segments."]);
    }

    #[test]
    fn senders_forward_events_and_outlive_their_receiver() {
        let (mut tx, rx) = mpsc::channel();
        tx.on_event(&RunEvent::Line {
            text: "Detected language 'ja'".to_owned(),
        });
        assert_eq!(
            rx.try_recv().ok(),
            Some(RunEvent::Line {
                text: "Detected language 'ja'".to_owned()
            })
        );

        drop(rx);
        tx.on_event(&RunEvent::Stopped { segments: 0 });
    }

    #[test]
    fn unit_observer_discards_events() {
        ().on_event(&RunEvent::Stopped { segments: 1 });
    }

    #[test]
    fn segment_events_serialize_flat() -> anyhow::Result<()> {
        let event = RunEvent::Segment(Segment {
            index: 3,
            start: TimeCode::from_millis(5_250),
            end: TimeCode::from_millis(7_000),
            text: "hello there".to_owned(),
        });
        let value: serde_json::Value = serde_json::from_str(&event.to_json_line()?)?;
        assert_eq!(value["event"], "segment");
        assert_eq!(value["index"], 3);
        assert_eq!(value["start"], "00:00:05,250");
        assert_eq!(value["end"], "00:00:07,000");
        assert_eq!(value["text"], "hello there");
        Ok(())
    }

    #[test]
    fn terminal_events_carry_their_details() -> anyhow::Result<()> {
        let line = RunEvent::Failed {
            error: "boom".to_owned(),
        }
        .to_json_line()?;
        assert_eq!(line, r#"{"event":"failed","error":"boom"}"#);
        Ok(())
    }
}
