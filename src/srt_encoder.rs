use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::segments::Segment;
use crate::timecode::TimeCode;
use crate::{Error, Result};

/// Streams numbered subtitle records in SRT format.
///
/// Design:
/// - The encoder owns the record counter, so indices are always `1..=N` in append order.
/// - Every record is flushed before `append` returns; a reader inspecting the destination
///   mid-run sees every segment observed so far.
/// - Nothing is written until the first record (an empty run produces an empty file).
pub struct SrtEncoder<W: Write> {
    /// The underlying writer we stream SRT into.
    w: W,

    /// Index assigned to the next appended record.
    next_index: u32,

    /// Whether the encoder has been closed.
    closed: bool,
}

impl<W: Write> SrtEncoder<W> {
    /// Create a new SRT encoder that writes to the provided writer.
    pub fn new(w: W) -> Self {
        Self {
            w,
            next_index: 1,
            closed: false,
        }
    }

    /// Index the next appended record will receive.
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Number of records written so far.
    pub fn written(&self) -> u32 {
        self.next_index - 1
    }

    /// Append one record and flush it.
    ///
    /// The counter only advances once the record is fully written; after an error the caller
    /// should stop appending.
    pub fn append(&mut self, start: TimeCode, end: TimeCode, text: &str) -> Result<Segment> {
        if self.closed {
            return Err(Error::EncoderClosed);
        }

        let segment = Segment {
            index: self.next_index,
            start,
            end,
            text: text.to_owned(),
        };

        // Format into one buffer so the record reaches the writer in a single write.
        let record = format!(
            "{}\n{} --> {}\n{}\n\n",
            segment.index, segment.start, segment.end, segment.text
        );
        self.w.write_all(record.as_bytes())?;
        self.w.flush()?;

        self.next_index += 1;
        Ok(segment)
    }

    /// Flush the underlying writer. This is idempotent.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.w.flush()?;
        self.closed = true;

        Ok(())
    }
}

/// An [`SrtEncoder`] bound to a working file on disk.
///
/// `File` has no userspace buffer, so a flushed record is already visible to other readers of
/// the path.
pub struct SubtitleFile {
    path: PathBuf,
    encoder: SrtEncoder<File>,
}

impl SubtitleFile {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path).map_err(|source| Error::Write {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            path,
            encoder: SrtEncoder::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> u32 {
        self.encoder.written()
    }

    pub fn append(&mut self, start: TimeCode, end: TimeCode, text: &str) -> Result<Segment> {
        self.encoder
            .append(start, end, text)
            .map_err(|err| with_path(&self.path, err))
    }

    pub fn close(&mut self) -> Result<()> {
        self.encoder.close().map_err(|err| with_path(&self.path, err))
    }
}

fn with_path(path: &Path, err: Error) -> Error {
    match err {
        Error::Io(source) => Error::Write {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    }
}
