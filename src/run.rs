//! One transcription run: launch the recognizer, stream its output into subtitle files, and
//! promote the working files once the recognizer is done.
//!
//! The run is a small state machine:
//!
//! ```text
//! Starting ──► Streaming ──► Finalizing ──► Completed
//!    │             │  └────────────────────► Stopped   (cancellation observed)
//!    └─────────────┴───────────────────────► Failed    (spawn, read, write or copy error)
//! ```
//!
//! Everything here is blocking and runs on the caller's thread; the controller is what moves
//! it onto a worker.

use std::fs;
use std::io::{self, BufRead};

use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::events::{Observer, RunEvent};
use crate::opts::Opts;
use crate::paths::{ArtifactPaths, TrackPaths};
use crate::recognizer::{Invocation, Recognizer, RecognizerHandle, Spawned};
use crate::segment_line::{has_segment_marker, parse_segment_line};
use crate::srt_encoder::SubtitleFile;
use crate::{Error, Result};

/// Externally visible lifecycle of a controller's current (or last) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Stopped,
    Failed,
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Both final files exist; the primary one is byte-identical to its working file.
    Completed {
        artifacts: ArtifactPaths,
        segments: u32,
    },

    /// Cancellation was observed. Working files were left as-is and never promoted.
    Stopped { segments: u32 },

    /// The run gave up. No final files are guaranteed.
    Failed { error: Error, segments: u32 },
}

impl RunOutcome {
    pub fn state(&self) -> RunState {
        match self {
            RunOutcome::Completed { .. } => RunState::Completed,
            RunOutcome::Stopped { .. } => RunState::Stopped,
            RunOutcome::Failed { .. } => RunState::Failed,
        }
    }

    /// Number of segments persisted to the primary working file.
    pub fn segments(&self) -> u32 {
        match self {
            RunOutcome::Completed { segments, .. }
            | RunOutcome::Stopped { segments }
            | RunOutcome::Failed { segments, .. } => *segments,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            RunOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    fn to_event(&self) -> RunEvent {
        match self {
            RunOutcome::Completed {
                artifacts,
                segments,
            } => RunEvent::Completed {
                primary: artifacts.primary.output.clone(),
                secondary: artifacts.secondary.output.clone(),
                segments: *segments,
            },
            RunOutcome::Stopped { segments } => RunEvent::Stopped {
                segments: *segments,
            },
            RunOutcome::Failed { error, .. } => RunEvent::Failed {
                error: error.to_string(),
            },
        }
    }
}

/// Execute one run to a terminal state.
///
/// `cancel` is checked once per recognizer output line (and at end of stream), so
/// cancellation takes effect within one line of output. Every outcome, including failures, is
/// reported through `observer` as well as returned.
pub fn execute<R: Recognizer>(
    recognizer: &R,
    opts: &Opts,
    cancel: &CancelToken,
    observer: &mut dyn Observer,
) -> RunOutcome {
    let run_id = Uuid::new_v4();
    let span = info_span!(
        "transcription_run",
        %run_id,
        source = %opts.source_path.display(),
        language = %opts.language,
    );
    let _entered = span.enter();

    let outcome = Run {
        opts,
        observer: &mut *observer,
    }
    .execute(recognizer, cancel);

    match &outcome {
        RunOutcome::Completed {
            artifacts,
            segments,
        } => info!(
            segments,
            output = %artifacts.primary.output.display(),
            "transcription completed"
        ),
        RunOutcome::Stopped { segments } => info!(segments, "transcription stopped"),
        RunOutcome::Failed { error, segments } => {
            error!(error = %error, segments, "transcription failed")
        }
    }
    observer.on_event(&outcome.to_event());

    outcome
}

struct Run<'a> {
    opts: &'a Opts,
    observer: &'a mut dyn Observer,
}

/// Why the streaming phase ended.
enum StreamEnd {
    Eof,
    Cancelled,
    ReadFailed(io::Error),
    WriteFailed(Error),
}

/// The two working files of a run.
struct Sinks {
    primary: SubtitleFile,

    /// Translation track. Opened and promoted, never written while translation is disabled.
    secondary: SubtitleFile,
}

impl Sinks {
    fn open(paths: &ArtifactPaths) -> Result<Self> {
        Ok(Self {
            primary: SubtitleFile::create(&paths.primary.working)?,
            secondary: SubtitleFile::create(&paths.secondary.working)?,
        })
    }

    fn written(&self) -> u32 {
        self.primary.written()
    }

    /// Close both files, reporting the first failure.
    fn close(&mut self) -> Result<()> {
        let primary = self.primary.close();
        let secondary = self.secondary.close();
        primary.and(secondary)
    }
}

impl Run<'_> {
    fn execute<R: Recognizer>(&mut self, recognizer: &R, cancel: &CancelToken) -> RunOutcome {
        // Starting
        let paths = ArtifactPaths::for_source(&self.opts.source_path, self.opts.language);
        let mut sinks = match Sinks::open(&paths) {
            Ok(sinks) => sinks,
            Err(error) => return RunOutcome::Failed { error, segments: 0 },
        };
        self.observer.on_event(&RunEvent::WorkingFiles {
            primary: paths.primary.working.clone(),
            secondary: paths.secondary.working.clone(),
        });

        let invocation = Invocation::new(self.opts, &paths);
        let command = recognizer.command_line(&invocation);
        info!(%command, "launching recognizer");
        self.observer.on_event(&RunEvent::Started { command });

        let Spawned { output, mut handle } = match recognizer.spawn(&invocation) {
            Ok(spawned) => spawned,
            Err(error) => {
                let _ = sinks.close();
                return RunOutcome::Failed { error, segments: 0 };
            }
        };

        // Streaming
        debug!("streaming recognizer output");
        let end = self.stream(output, cancel, &mut sinks.primary);
        let segments = sinks.written();

        match end {
            StreamEnd::Eof => {}
            StreamEnd::Cancelled => {
                shut_down(&mut handle);
                let _ = sinks.close();
                return RunOutcome::Stopped { segments };
            }
            StreamEnd::WriteFailed(error) => {
                shut_down(&mut handle);
                let _ = sinks.close();
                return RunOutcome::Failed { error, segments };
            }
            StreamEnd::ReadFailed(err) if segments == 0 => {
                shut_down(&mut handle);
                let _ = sinks.close();
                return RunOutcome::Failed {
                    error: Error::StreamRead(err),
                    segments,
                };
            }
            StreamEnd::ReadFailed(err) => {
                warn!(error = %err, segments, "recognizer output failed; keeping what was written");
            }
        }

        if let Err(error) = sinks.close() {
            shut_down(&mut handle);
            return RunOutcome::Failed { error, segments };
        }

        match handle.wait() {
            Ok(Some(0)) => debug!("recognizer exited"),
            Ok(Some(code)) => warn!(code, "recognizer exited with a non-zero status"),
            Ok(None) => warn!("recognizer was terminated by a signal"),
            Err(err) => warn!(error = %err, "failed to wait for recognizer"),
        }

        // Finalizing
        debug!("promoting working files");
        if let Err(error) = promote(&paths.primary).and_then(|()| promote(&paths.secondary)) {
            return RunOutcome::Failed { error, segments };
        }

        RunOutcome::Completed {
            artifacts: paths,
            segments,
        }
    }

    fn stream<B: BufRead>(
        &mut self,
        mut output: B,
        cancel: &CancelToken,
        primary: &mut SubtitleFile,
    ) -> StreamEnd {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match output.read_until(b'\n', &mut buf) {
                Ok(0) if cancel.is_cancelled() => return StreamEnd::Cancelled,
                Ok(0) => return StreamEnd::Eof,
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) if cancel.is_cancelled() => return StreamEnd::Cancelled,
                Err(err) => return StreamEnd::ReadFailed(err),
            }

            if cancel.is_cancelled() {
                debug!("cancellation observed");
                return StreamEnd::Cancelled;
            }

            // Invalid UTF-8 from the recognizer must not abort the run.
            let raw = String::from_utf8_lossy(&buf);
            let line = raw.trim_end_matches(['\r', '\n']);
            debug!(line, "recognizer output");
            self.observer.on_event(&RunEvent::Line {
                text: line.to_owned(),
            });

            if !has_segment_marker(line) {
                continue;
            }
            let Some(parsed) = parse_segment_line(line) else {
                debug!(line, "marker line is not a segment");
                continue;
            };

            match primary.append(parsed.start(), parsed.end(), &parsed.text) {
                Ok(segment) => self.observer.on_event(&RunEvent::Segment(segment)),
                Err(error) => return StreamEnd::WriteFailed(error),
            }
        }
    }
}

/// Terminate the recognizer and reap it.
fn shut_down<H: RecognizerHandle>(handle: &mut H) {
    if let Err(err) = handle.terminate() {
        warn!(error = %err, "failed to terminate recognizer");
    }
    if let Err(err) = handle.wait() {
        warn!(error = %err, "failed to wait for recognizer");
    }
}

/// Copy a working file over its final path.
fn promote(track: &TrackPaths) -> Result<()> {
    fs::copy(&track.working, &track.output)
        .map(|_| ())
        .map_err(|source| Error::Finalize {
            from: track.working.clone(),
            to: track.output.clone(),
            source,
        })
}
