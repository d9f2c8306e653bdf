// Thread-safe callback mechanism for player events
// Events can originate on the caller's thread or on the backend's notifier thread

use crate::state::PlayerState;
use parking_lot::Mutex;
use std::sync::Arc;

/// Player event types
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackEvent {
    /// Player state changed
    StateChanged {
        old_state: PlayerState,
        new_state: PlayerState,
    },

    /// Playback of a new file started
    Started,

    /// Playback stopped by the user
    Stopped,

    /// Playback reached the end of the file
    PlaybackCompleted,

    /// Logical volume changed
    VolumeChanged { volume: f32 },

    /// Mute toggled
    MuteChanged { muted: bool },

    /// Loop toggled
    LoopChanged { looping: bool },

    /// Backend reported an output error
    Error { message: String },
}

/// Player callback trait
/// Implementations should be lightweight and non-blocking
pub trait PlayerCallback: Send + Sync {
    /// Called when an event occurs
    /// This may run on the backend's notifier thread
    fn on_event(&self, event: CallbackEvent);
}

/// Callback manager for handling multiple callbacks
pub struct CallbackManager {
    callbacks: Mutex<Vec<Arc<dyn PlayerCallback>>>,
}

impl CallbackManager {
    pub fn new() -> Self {
        Self {
            callbacks: Mutex::new(Vec::new()),
        }
    }

    pub fn add_callback(&self, callback: Arc<dyn PlayerCallback>) {
        self.callbacks.lock().push(callback);
    }

    pub fn clear_callbacks(&self) {
        self.callbacks.lock().clear();
    }

    pub fn dispatch_event(&self, event: CallbackEvent) {
        // Snapshot so a callback may register further callbacks without deadlocking
        let callbacks: Vec<_> = self.callbacks.lock().clone();
        for callback in callbacks.iter() {
            callback.on_event(event.clone());
        }
    }
}

impl Default for CallbackManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple callback implementation for testing
#[cfg(test)]
pub struct TestCallback {
    events: Mutex<Vec<CallbackEvent>>,
}

#[cfg(test)]
impl TestCallback {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn get_events(&self) -> Vec<CallbackEvent> {
        self.events.lock().clone()
    }
}

#[cfg(test)]
impl PlayerCallback for TestCallback {
    fn on_event(&self, event: CallbackEvent) {
        self.events.lock().push(event);
    }
}
