use std::io::{self, Write};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing::error;

use livesub::opts::{DEFAULT_BEAM_SIZE, DEFAULT_DEVICE, DEFAULT_MODEL, DEFAULT_PROGRAM};
use livesub::{CancelToken, Controller, EngineOpts, Language, RunEvent, RunOutcome, StartStatus};

fn main() {
    livesub::logging::init();

    match run() {
        Ok(RunOutcome::Completed { .. }) => {}
        Ok(RunOutcome::Stopped { .. }) => std::process::exit(130),
        Ok(RunOutcome::Failed { .. }) => std::process::exit(1),
        Err(err) => {
            error!(error = ?err, "livesub-cli failed");
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<RunOutcome> {
    let params = Params::parse();

    let engine = EngineOpts {
        program: params.recognizer,
        model: params.model,
        device: params.device,
    };
    let mut controller = Controller::new(engine);

    let events = params.events;
    let observer = move |event: &RunEvent| print_event(events, event);

    let status = controller
        .start(params.source, params.language, params.beam_size, observer)
        .context("failed to start transcription")?;
    if status == StartStatus::AlreadyRunning {
        bail!("a transcription is already running");
    }

    if let Some(token) = controller.cancel_token() {
        cancel_on_ctrl_c(token)?;
    }

    controller
        .wait()
        .context("transcription run disappeared before finishing")
}

/// Cancel the run when the user presses Ctrl-C.
///
/// Cancellation is cooperative: the run notices it on the next line of recognizer output.
/// The recognizer runs in its own process group, so the keypress does not reach it directly.
fn cancel_on_ctrl_c(token: CancelToken) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build signal runtime")?;

    thread::Builder::new()
        .name("livesub-signal".to_owned())
        .spawn(move || {
            if runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
                eprintln!("Stopping transcription...");
                token.cancel();
            }
        })
        .context("failed to spawn signal thread")?;

    Ok(())
}

fn print_event(format: EventFormat, event: &RunEvent) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let res = match format {
        EventFormat::Text => writeln!(out, "{event}"),
        EventFormat::Json => match event.to_json_line() {
            Ok(line) => writeln!(out, "{line}"),
            Err(err) => {
                error!(error = %err, "failed to encode event");
                return;
            }
        },
    };

    // A closed stdout must not take the run down with it.
    let _ = res.and_then(|()| out.flush());
}

/// How progress events are printed.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum EventFormat {
    /// Human-readable lines.
    Text,

    /// One JSON object per line.
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "livesub")]
#[command(about = "Generate subtitles live with an external Whisper recognizer")]
struct Params {
    /// Audio or video file to transcribe. Subtitles are written next to it.
    #[arg(short = 'a', long = "source")]
    source: PathBuf,

    /// Spoken language, or `auto` to let the recognizer detect it.
    #[arg(short = 'l', long = "language", value_enum, default_value_t = Language::Chinese)]
    language: Language,

    /// Beam width for the recognizer's decoder.
    #[arg(short = 'b', long = "beam-size", default_value_t = DEFAULT_BEAM_SIZE)]
    beam_size: NonZeroU32,

    /// Recognizer model name.
    #[arg(short = 'm', long = "model", default_value = DEFAULT_MODEL)]
    model: String,

    /// Recognizer device selector.
    #[arg(short = 'd', long = "device", default_value = DEFAULT_DEVICE)]
    device: String,

    /// Recognizer executable.
    #[arg(long = "recognizer", default_value = DEFAULT_PROGRAM)]
    recognizer: PathBuf,

    /// Progress output format.
    #[arg(long = "events", value_enum, default_value_t = EventFormat::Text)]
    events: EventFormat,
}
