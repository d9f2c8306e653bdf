// Controller configuration

use crate::error::{AudioError, Result};
use crate::format::AudioFormat;
use crate::gain::is_valid_volume;

/// Volume a controller starts with unless configured otherwise
pub const DEFAULT_VOLUME: f32 = 0.5;

/// Settings a controller is constructed with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    /// Initial logical volume (0.0 - 1.0)
    pub default_volume: f32,
    /// The single format `is_supported_file` accepts
    pub format: AudioFormat,
}

impl ControllerConfig {
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.default_volume = volume;
        self
    }

    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !is_valid_volume(self.default_volume) {
            return Err(AudioError::InvalidConfig(format!(
                "default volume {} is outside 0.0..=1.0",
                self.default_volume
            )));
        }
        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            default_volume: DEFAULT_VOLUME,
            format: AudioFormat::Wav,
        }
    }
}
