//! The external speech-to-text engine, seen from the run's side.
//!
//! A [`Recognizer`] launches one recognition job and hands back two things: the job's
//! line-oriented standard output and a handle to control its lifetime. The built-in
//! [`ExternalRecognizer`] runs a faster-whisper style executable; tests and embedders can plug
//! in their own implementation.

use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Read};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread;

use tracing::{debug, warn};

use crate::language::Language;
use crate::opts::Opts;
use crate::paths::ArtifactPaths;
use crate::{Error, Result};

/// Everything the recognizer needs to know about one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub source_path: PathBuf,
    pub output_dir: PathBuf,
    pub model: String,
    pub device: String,
    pub beam_size: NonZeroU32,
    pub language: Language,
}

impl Invocation {
    pub fn new(opts: &Opts, paths: &ArtifactPaths) -> Self {
        Self {
            source_path: opts.source_path.clone(),
            output_dir: paths.output_dir.clone(),
            model: opts.model.clone(),
            device: opts.device.clone(),
            beam_size: opts.beam_size,
            language: opts.language,
        }
    }

    /// Command-line arguments, in the order the recognizer expects them.
    ///
    /// Output format and task are fixed: subtitles, transcription (never translation).
    /// `--verbose true` is what makes the recognizer print one line per segment.
    pub fn args(&self) -> Vec<OsString> {
        vec![
            self.source_path.clone().into_os_string(),
            "--model".into(),
            self.model.clone().into(),
            "--device".into(),
            self.device.clone().into(),
            "--output_dir".into(),
            self.output_dir.clone().into_os_string(),
            "--output_format".into(),
            "srt".into(),
            "--task".into(),
            "transcribe".into(),
            "--beam_size".into(),
            self.beam_size.to_string().into(),
            "--language".into(),
            self.language.recognizer_arg().into(),
            "--verbose".into(),
            "true".into(),
            "--standard_asia".into(),
        ]
    }

    /// Human-readable command line for progress output and logs.
    pub fn command_line(&self, program: &Path) -> String {
        std::iter::once(program.as_os_str().to_os_string())
            .chain(self.args())
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A launched recognition job.
pub struct Spawned<O, H> {
    /// The job's standard output.
    pub output: O,

    /// Lifetime control for the job.
    pub handle: H,
}

/// Lifetime control for a launched recognition job.
pub trait RecognizerHandle {
    /// Ask the job to stop. It may take a moment to actually exit.
    fn terminate(&mut self) -> io::Result<()>;

    /// Block until the job exits. Returns the exit code, or `None` if it was killed by a signal.
    fn wait(&mut self) -> io::Result<Option<i32>>;
}

/// Pluggable recognizer used by [`crate::controller::Controller`].
///
/// `spawn` runs on the run's worker thread; the recognizer itself is shared across runs.
pub trait Recognizer: Send + Sync + 'static {
    /// Line-oriented standard output of a job.
    type Output: BufRead;

    /// Lifetime control of a job.
    type Handle: RecognizerHandle;

    /// Launch one job. A failure here means there is no process to manage.
    fn spawn(&self, invocation: &Invocation) -> Result<Spawned<Self::Output, Self::Handle>>;

    /// Command line shown in progress output.
    fn command_line(&self, invocation: &Invocation) -> String;
}

/// Runs the recognizer as an external executable.
#[derive(Debug, Clone)]
pub struct ExternalRecognizer {
    program: PathBuf,
}

impl ExternalRecognizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Recognizer for ExternalRecognizer {
    type Output = BufReader<ChildStdout>;
    type Handle = ChildHandle;

    fn spawn(&self, invocation: &Invocation) -> Result<Spawned<Self::Output, Self::Handle>> {
        let spawn_err = |source: io::Error| Error::Spawn {
            program: self.program.display().to_string(),
            source,
        };

        let mut command = Command::new(&self.program);
        command
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        own_process_group(&mut command);
        let mut child = command.spawn().map_err(spawn_err)?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(spawn_err(io::Error::other("recognizer stdout was not captured")));
        };

        // stderr is never interpreted, but it must be drained or a chatty recognizer would
        // block once the pipe fills up. The drain thread is detached: a grandchild holding
        // the pipe open must not keep a run from finishing.
        if let Some(stderr) = child.stderr.take() {
            drain_to_log(stderr);
        }

        Ok(Spawned {
            output: BufReader::new(stdout),
            handle: ChildHandle {
                child,
                reaped: false,
            },
        })
    }

    fn command_line(&self, invocation: &Invocation) -> String {
        invocation.command_line(&self.program)
    }
}

/// Handle to a recognizer child process.
///
/// Dropping the handle without waiting kills and reaps the child.
pub struct ChildHandle {
    child: Child,
    reaped: bool,
}

impl RecognizerHandle for ChildHandle {
    fn terminate(&mut self) -> io::Result<()> {
        self.child.kill()
    }

    fn wait(&mut self) -> io::Result<Option<i32>> {
        let status = self.child.wait()?;
        self.reaped = true;
        Ok(status.code())
    }
}

impl Drop for ChildHandle {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Start the recognizer in a process group of its own.
///
/// A terminal Ctrl-C then reaches only the host, which stops the run through its cancel token.
/// Otherwise the recognizer could exit first and the run would promote partial output.
#[cfg(unix)]
fn own_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(windows)]
fn own_process_group(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    command.creation_flags(CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn own_process_group(_command: &mut Command) {}

fn drain_to_log<R: Read + Send + 'static>(stderr: R) {
    let span = tracing::Span::current();
    let spawned = thread::Builder::new()
        .name("livesub-stderr".to_owned())
        .spawn(move || {
            let _entered = span.enter();
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf);
                        debug!(line = %line.trim_end(), "recognizer stderr");
                    }
                }
            }
        });

    if let Err(err) = spawned {
        warn!(error = %err, "failed to start recognizer stderr reader");
    }
}
