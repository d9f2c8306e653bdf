// Supported file formats and extension matching

use crate::error::AudioError;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Format a controller instance accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioFormat {
    #[default]
    Wav,
    Aiff,
    Flac,
}

impl AudioFormat {
    /// File extensions for this format, lowercase
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            AudioFormat::Wav => &["wav"],
            AudioFormat::Aiff => &["aiff", "aif"],
            AudioFormat::Flac => &["flac"],
        }
    }

    /// Case-insensitive extension check on `path`
    pub fn matches(self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.extensions()
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let tag = match self {
            AudioFormat::Wav => "WAV",
            AudioFormat::Aiff => "AIFF",
            AudioFormat::Flac => "FLAC",
        };
        f.write_str(tag)
    }
}

impl FromStr for AudioFormat {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [AudioFormat::Wav, AudioFormat::Aiff, AudioFormat::Flac]
            .into_iter()
            .find(|format| {
                format
                    .extensions()
                    .iter()
                    .any(|ext| s.eq_ignore_ascii_case(ext))
            })
            .ok_or_else(|| AudioError::InvalidConfig(format!("Unknown audio format: {}", s)))
    }
}
