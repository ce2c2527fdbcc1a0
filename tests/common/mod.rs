#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use livesub::recognizer::{Invocation, RecognizerHandle, Spawned};
use livesub::{Error, Recognizer, Result, RunEvent};

/// An in-process recognizer that replays a fixed script of output lines.
#[derive(Clone, Default)]
pub struct ScriptedRecognizer {
    lines: Vec<String>,
    delay: Duration,
    endless: bool,
    read_error_after: Option<usize>,
    fail_spawn: bool,

    pub spawns: Arc<AtomicUsize>,
    pub terminated: Arc<AtomicBool>,
    pub invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl ScriptedRecognizer {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sleep before producing each line.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Keep printing progress lines after the script instead of ending the stream.
    pub fn endless(mut self) -> Self {
        self.endless = true;
        self
    }

    /// Fail the output stream after this many lines.
    pub fn read_error_after(mut self, lines: usize) -> Self {
        self.read_error_after = Some(lines);
        self
    }

    pub fn failing_spawn(mut self) -> Self {
        self.fail_spawn = true;
        self
    }
}

impl Recognizer for ScriptedRecognizer {
    type Output = BufReader<ScriptedOutput>;
    type Handle = ScriptedHandle;

    fn spawn(&self, invocation: &Invocation) -> Result<Spawned<Self::Output, Self::Handle>> {
        self.spawns.fetch_add(1, Ordering::SeqCst);
        self.invocations
            .lock()
            .expect("invocations lock")
            .push(invocation.clone());

        if self.fail_spawn {
            return Err(Error::Spawn {
                program: "scripted".to_owned(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such recognizer"),
            });
        }

        let terminated = Arc::new(AtomicBool::new(false));
        self.terminated.store(false, Ordering::SeqCst);
        let output = ScriptedOutput {
            pending: self.lines.iter().cloned().collect(),
            current: Vec::new(),
            pos: 0,
            produced: 0,
            delay: self.delay,
            endless: self.endless,
            read_error_after: self.read_error_after,
            terminated: Arc::clone(&terminated),
        };

        Ok(Spawned {
            output: BufReader::new(output),
            handle: ScriptedHandle {
                terminated,
                shared: Arc::clone(&self.terminated),
            },
        })
    }

    fn command_line(&self, invocation: &Invocation) -> String {
        invocation.command_line(Path::new("scripted"))
    }
}

pub struct ScriptedOutput {
    pending: VecDeque<String>,
    current: Vec<u8>,
    pos: usize,
    produced: usize,
    delay: Duration,
    endless: bool,
    read_error_after: Option<usize>,
    terminated: Arc<AtomicBool>,
}

impl Read for ScriptedOutput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos == self.current.len() {
            if self.terminated.load(Ordering::SeqCst) {
                return Ok(0);
            }
            if self.read_error_after == Some(self.produced) {
                return Err(io::Error::other("recognizer pipe broke"));
            }
            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }

            let line = match self.pending.pop_front() {
                Some(line) => line,
                None if self.endless => format!("progress {}", self.produced),
                None => return Ok(0),
            };
            self.current = format!("{line}\n").into_bytes();
            self.pos = 0;
            self.produced += 1;
        }

        let n = buf.len().min(self.current.len() - self.pos);
        buf[..n].copy_from_slice(&self.current[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

pub struct ScriptedHandle {
    terminated: Arc<AtomicBool>,
    shared: Arc<AtomicBool>,
}

impl RecognizerHandle for ScriptedHandle {
    fn terminate(&mut self) -> io::Result<()> {
        self.terminated.store(true, Ordering::SeqCst);
        self.shared.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn wait(&mut self) -> io::Result<Option<i32>> {
        if self.terminated.load(Ordering::SeqCst) {
            Ok(None)
        } else {
            Ok(Some(0))
        }
    }
}

/// Observer that forwards every event over a channel.
pub fn channel_observer() -> (mpsc::Sender<RunEvent>, mpsc::Receiver<RunEvent>) {
    mpsc::channel()
}

pub fn segment_events(events: &[RunEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, RunEvent::Segment(_)))
        .count()
}
