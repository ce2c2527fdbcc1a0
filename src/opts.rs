use std::num::NonZeroU32;
use std::path::PathBuf;

use crate::language::Language;

/// Recognizer executable looked up on `PATH` when none is configured.
pub const DEFAULT_PROGRAM: &str = "whisper-faster";

/// Model name passed to the recognizer when none is configured.
pub const DEFAULT_MODEL: &str = "large-v3";

/// Device selector passed to the recognizer when none is configured.
pub const DEFAULT_DEVICE: &str = "cuda";

/// Beam size used when the caller does not pick one.
pub const DEFAULT_BEAM_SIZE: NonZeroU32 = match NonZeroU32::new(3) {
    Some(n) => n,
    None => unreachable!(),
};

/// Long-lived recognizer settings, fixed when a [`crate::controller::Controller`] is built.
///
/// This is *library-level configuration*, not CLI flags directly; the CLI maps its flags into
/// this type so other frontends can construct it programmatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOpts {
    /// Recognizer executable (a bare name is resolved through `PATH`).
    pub program: PathBuf,

    /// Model identifier, e.g. `large-v3`.
    pub model: String,

    /// Device selector, e.g. `cuda` or `cpu`.
    pub device: String,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            model: DEFAULT_MODEL.to_owned(),
            device: DEFAULT_DEVICE.to_owned(),
        }
    }
}

/// Options for a single transcription run.
///
/// Supplied once at start and immutable for the run's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Audio or video file handed to the recognizer. Subtitles are written next to it.
    pub source_path: PathBuf,

    /// Spoken language, or `Auto` to let the recognizer detect it.
    pub language: Language,

    /// Beam width for the recognizer's decoder.
    pub beam_size: NonZeroU32,

    /// Model identifier, copied from [`EngineOpts`].
    pub model: String,

    /// Device selector, copied from [`EngineOpts`].
    pub device: String,
}

impl Opts {
    pub fn new(
        engine: &EngineOpts,
        source_path: impl Into<PathBuf>,
        language: Language,
        beam_size: NonZeroU32,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            language,
            beam_size,
            model: engine.model.clone(),
            device: engine.device.clone(),
        }
    }
}
