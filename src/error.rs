use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Livesub's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Livesub's crate-wide error type.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs.
#[derive(Debug, Error)]
pub enum Error {
    /// The recognizer executable could not be launched.
    #[error("failed to launch recognizer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The recognizer's output stream failed mid-run.
    #[error("failed to read recognizer output: {0}")]
    StreamRead(#[source] io::Error),

    /// A subtitle record could not be written to its working file.
    #[error("failed to write subtitles to '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A working file could not be promoted to its final path.
    #[error("failed to copy '{}' to '{}': {source}", from.display(), to.display())]
    Finalize {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write segment: encoder is already closed")]
    EncoderClosed,

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}
