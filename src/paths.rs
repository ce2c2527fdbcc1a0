//! Where a run's subtitle files live.
//!
//! Given `dir/base.ext` and language tag `L`:
//! - working files: `dir/base.L.tmp.srt` and `dir/base.en.tmp.srt`
//! - final files:   `dir/base.L.srt` and `dir/base.en.srt`

use std::path::{Path, PathBuf};

use crate::language::Language;

/// Tag of the secondary (translation) subtitle track.
pub const SECONDARY_TAG: &str = "en";

/// Working and final locations of one subtitle track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPaths {
    pub working: PathBuf,
    pub output: PathBuf,
}

impl TrackPaths {
    fn new(dir: &Path, base: &str, tag: &str) -> Self {
        Self {
            working: dir.join(format!("{base}.{tag}.tmp.srt")),
            output: dir.join(format!("{base}.{tag}.srt")),
        }
    }
}

/// The artifacts of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Directory the source lives in; also handed to the recognizer as its output directory.
    pub output_dir: PathBuf,

    /// Subtitles in the spoken language.
    pub primary: TrackPaths,

    /// Translation track. Never written while translation is disabled.
    pub secondary: TrackPaths,
}

impl ArtifactPaths {
    pub fn for_source(source: &Path, language: Language) -> Self {
        let output_dir = match source.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let base = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            primary: TrackPaths::new(&output_dir, &base, language.tag()),
            secondary: TrackPaths::new(&output_dir, &base, SECONDARY_TAG),
            output_dir,
        }
    }
}
