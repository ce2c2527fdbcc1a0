//! High-level API for running live transcriptions.
//!
//! We expose a single entry point (`Controller`) that owns the recognizer configuration and at
//! most one background run at a time.
//!
//! The intent is:
//! - We construct the controller once, with the recognizer and its model/device settings.
//! - Callers `start` a run for a source file and get progress through an [`Observer`].
//! - `stop` cancels cooperatively and blocks until the run has fully let go of its files and
//!   process.

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::Result;
use crate::cancel::CancelToken;
use crate::error::Error;
use crate::events::Observer;
use crate::language::Language;
use crate::opts::{EngineOpts, Opts};
use crate::recognizer::{ExternalRecognizer, Recognizer};
use crate::run::{self, RunOutcome, RunState};

/// What `start` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStatus {
    /// A new run was launched on a background thread.
    Started,

    /// A run is already in progress; the request was dropped (never queued).
    AlreadyRunning,
}

struct ActiveRun {
    cancel: CancelToken,
    worker: JoinHandle<RunOutcome>,
}

/// Lifecycle manager for transcription runs.
///
/// `Controller` owns:
/// - the recognizer (shared with each run's worker thread)
/// - the engine settings every run inherits
/// - the single active run, if any
///
/// Dropping a controller with a live run cancels it and waits for it to finish.
pub struct Controller<R: Recognizer = ExternalRecognizer> {
    recognizer: Arc<R>,
    engine: EngineOpts,
    active: Option<ActiveRun>,
    last_state: RunState,
}

impl Controller<ExternalRecognizer> {
    /// Create a controller that launches `engine.program` as the recognizer.
    pub fn new(engine: EngineOpts) -> Self {
        let recognizer = ExternalRecognizer::new(engine.program.clone());
        Self::with_recognizer(recognizer, engine)
    }
}

impl<R: Recognizer> Controller<R> {
    /// Create a controller around a custom recognizer.
    pub fn with_recognizer(recognizer: R, engine: EngineOpts) -> Self {
        Self {
            recognizer: Arc::new(recognizer),
            engine,
            active: None,
            last_state: RunState::Idle,
        }
    }

    pub fn engine(&self) -> &EngineOpts {
        &self.engine
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Start transcribing `source_path` in the background.
    ///
    /// Returns immediately. If a run is already in progress this is a no-op that reports
    /// [`StartStatus::AlreadyRunning`]. Errors only if the worker thread cannot be created.
    pub fn start(
        &mut self,
        source_path: impl Into<PathBuf>,
        language: Language,
        beam_size: NonZeroU32,
        observer: impl Observer + 'static,
    ) -> Result<StartStatus> {
        let opts = Opts::new(&self.engine, source_path, language, beam_size);
        self.start_with(opts, observer)
    }

    /// Like [`Controller::start`], with fully specified run options.
    pub fn start_with(
        &mut self,
        opts: Opts,
        observer: impl Observer + 'static,
    ) -> Result<StartStatus> {
        if self.is_running() {
            info!(source = %opts.source_path.display(), "transcription is already running");
            return Ok(StartStatus::AlreadyRunning);
        }

        // A previous run may have finished without anyone joining it.
        if let Some(finished) = self.active.take() {
            let outcome = self.join(finished);
            info!(state = ?outcome.state(), "reaped previous transcription run");
        }

        let cancel = CancelToken::new();
        let token = cancel.clone();
        let recognizer = Arc::clone(&self.recognizer);
        let mut observer = observer;

        let worker = thread::Builder::new()
            .name("livesub-run".to_owned())
            .spawn(move || run::execute(&*recognizer, &opts, &token, &mut observer))?;

        self.active = Some(ActiveRun { cancel, worker });
        self.last_state = RunState::Running;
        Ok(StartStatus::Started)
    }

    /// Cancel the active run and block until it reaches a terminal state.
    ///
    /// After this returns, the run performs no further file writes or process activity.
    /// Returns `None` when there is nothing to stop. A run that already finished on its own is
    /// joined and its outcome returned unchanged.
    pub fn stop(&mut self) -> Option<RunOutcome> {
        let Some(active) = self.active.take() else {
            info!("no transcription is running");
            return None;
        };

        active.cancel.cancel();
        Some(self.join(active))
    }

    /// Block until the active run finishes on its own. Returns `None` if there is no run.
    pub fn wait(&mut self) -> Option<RunOutcome> {
        let active = self.active.take()?;
        Some(self.join(active))
    }

    /// Whether a run is in progress right now.
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.worker.is_finished())
    }

    /// Current lifecycle state. A run that has finished in the background is joined here.
    pub fn state(&mut self) -> RunState {
        if self.is_running() {
            return RunState::Running;
        }
        if let Some(finished) = self.active.take() {
            self.join(finished);
        }
        self.last_state
    }

    /// Token of the active run, for cancelling from another thread (e.g. a signal handler).
    ///
    /// Cancelling through the token does not wait; follow up with [`Controller::wait`].
    pub fn cancel_token(&self) -> Option<CancelToken> {
        self.active.as_ref().map(|active| active.cancel.clone())
    }

    fn join(&mut self, active: ActiveRun) -> RunOutcome {
        let outcome = active.worker.join().unwrap_or_else(|_| {
            warn!("transcription worker panicked");
            RunOutcome::Failed {
                error: Error::msg("transcription worker panicked"),
                segments: 0,
            }
        });
        self.last_state = outcome.state();
        outcome
    }
}

impl<R: Recognizer> Drop for Controller<R> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            let _ = active.worker.join();
        }
    }
}
