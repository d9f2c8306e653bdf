// Core types and traits for wavdeck single-clip playback

pub mod backend;
pub mod callback;
pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod gain;
pub mod state;

// Re-export commonly used types
pub use backend::{AudioBackend, BackendEvent, BackendListener, ClipId, SubscriptionId, MIN_GAIN_DB};
pub use callback::{CallbackEvent, CallbackManager, PlayerCallback};
pub use config::{ControllerConfig, DEFAULT_VOLUME};
pub use controller::PlaybackController;
pub use error::{AudioError, Result};
pub use format::AudioFormat;
pub use state::{PlaybackStatus, PlayerState, PlayerStateContainer};
