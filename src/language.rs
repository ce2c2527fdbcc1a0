use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::Error;

/// The spoken languages a run can be pinned to.
///
/// Integration notes:
/// - With the `cli` feature, `ValueEnum` lets this enum be used directly as a CLI flag.
/// - `Auto` leaves detection to the recognizer; its file-name tag is `auto`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[cfg_attr(feature = "cli", value(name = "ja"))]
    Japanese,
    #[cfg_attr(feature = "cli", value(name = "ko"))]
    Korean,
    #[cfg_attr(feature = "cli", value(name = "zh"))]
    #[default]
    Chinese,
    #[cfg_attr(feature = "cli", value(name = "yue"))]
    Cantonese,
    #[cfg_attr(feature = "cli", value(name = "auto"))]
    Auto,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Japanese,
        Language::Korean,
        Language::Chinese,
        Language::Cantonese,
        Language::Auto,
    ];

    /// Short tag used in subtitle file names (`movie.<tag>.srt`).
    pub fn tag(&self) -> &'static str {
        match self {
            Language::Japanese => "ja",
            Language::Korean => "ko",
            Language::Chinese => "zh",
            Language::Cantonese => "yue",
            Language::Auto => "auto",
        }
    }

    /// Value passed to the recognizer's `--language` flag.
    ///
    /// The recognizer treats the literal `None` as "detect the language".
    pub fn recognizer_arg(&self) -> &'static str {
        match self {
            Language::Auto => "None",
            other => other.tag(),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Language::ALL
            .into_iter()
            .find(|lang| lang.tag().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::msg(format!("unsupported language tag '{wanted}'")))
    }
}
