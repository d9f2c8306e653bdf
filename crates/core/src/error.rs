// Error handling for the playback controller and its backends

use thiserror::Error;

/// Errors surfaced by the controller and by audio backends
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    /// The backend could not open or decode the file
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Volume outside [0.0, 1.0]
    #[error("Invalid volume {0}: must be between 0 and 1")]
    InvalidVolume(f32),

    /// Operation needs an open clip
    #[error("Not playing")]
    NotPlaying,

    /// Resume without a prior pause
    #[error("Not paused")]
    NotPaused,

    /// Output device error (hardware issues)
    #[error("Device error: {0}")]
    DeviceError(String),

    /// Backend failed to start, stop or reconfigure a clip
    #[error("Playback error: {0}")]
    PlaybackError(String),

    /// Backend was handed a clip id it does not know
    #[error("Unknown clip: {0}")]
    UnknownClip(u64),

    /// Rejected controller configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type alias for audio operations
pub type Result<T> = std::result::Result<T, AudioError>;

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::BackendUnavailable(err.to_string())
    }
}
