// Audio backend abstraction layer

use crate::error::Result;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Lowest gain a backend is expected to support, in decibels.
/// Gains at or below this level are rendered as silence.
pub const MIN_GAIN_DB: f32 = -80.0;

/// Opaque handle to a clip opened by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipId(pub u64);

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle returned by `AudioBackend::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Notification emitted by a backend, possibly from its own thread
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// Output started for the clip
    Started { clip: ClipId },
    /// Output halted by an explicit stop
    Stopped { clip: ClipId },
    /// Clip played through to its last frame without looping
    ReachedEnd { clip: ClipId },
    /// Output failed while the clip was open
    Error { clip: ClipId, message: String },
}

impl BackendEvent {
    pub fn clip(&self) -> ClipId {
        match self {
            BackendEvent::Started { clip }
            | BackendEvent::Stopped { clip }
            | BackendEvent::ReachedEnd { clip }
            | BackendEvent::Error { clip, .. } => *clip,
        }
    }
}

/// Receiver of backend notifications
/// Implementations must not call back into the backend synchronously
pub trait BackendListener: Send + Sync {
    fn on_backend_event(&self, event: BackendEvent);
}

/// Platform audio facility that decodes files into clips and plays them.
/// Methods take `&self`: backends synchronize internally because their
/// notifications are produced on other threads.
pub trait AudioBackend: Send + Sync {
    /// Decode `path` into a new clip, ready to start from frame zero
    fn open(&self, path: &Path) -> Result<ClipId>;

    /// Start (or restart) output from the current position
    fn start(&self, clip: ClipId) -> Result<()>;

    /// Halt output, keeping the position
    fn stop(&self, clip: ClipId) -> Result<()>;

    /// Release the clip and everything it holds
    fn close(&self, clip: ClipId) -> Result<()>;

    /// Rewind to the first frame
    fn set_position_to_start(&self, clip: ClipId) -> Result<()>;

    /// Loop continuously from the current position, or play once through
    fn set_loop(&self, clip: ClipId, enabled: bool) -> Result<()>;

    /// Apply output gain in decibels without interrupting playback
    fn set_gain_db(&self, clip: ClipId, db: f32) -> Result<()>;

    /// Gain used for a linear volume of zero
    fn min_gain_db(&self) -> f32 {
        MIN_GAIN_DB
    }

    /// Register a listener for every clip this backend opens
    fn subscribe(&self, listener: Arc<dyn BackendListener>) -> SubscriptionId;

    /// Remove a listener registered with `subscribe`
    fn unsubscribe(&self, id: SubscriptionId);
}
