// Scripted in-memory backend and recording callback shared by the integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wavdeck_core::{
    AudioBackend, AudioError, BackendEvent, BackendListener, CallbackEvent, ClipId,
    PlayerCallback, Result, SubscriptionId,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Open(PathBuf),
    Start(ClipId),
    Stop(ClipId),
    Close(ClipId),
    Rewind(ClipId),
    SetLoop(ClipId, bool),
    SetGain(ClipId, f32),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockClip {
    pub playing: bool,
    pub looping: bool,
    pub gain_db: Option<f32>,
}

#[derive(Default)]
struct MockState {
    next_clip: u64,
    next_subscription: u64,
    clips: HashMap<ClipId, MockClip>,
    calls: Vec<Call>,
    fail_next_start: bool,
}

/// Backend that decodes nothing: files named `*.wav` open, anything with
/// "corrupt" in the name or another extension fails like a decoder would.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
    listeners: Mutex<Vec<(SubscriptionId, Arc<dyn BackendListener>)>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn clip(&self, clip: ClipId) -> Option<MockClip> {
        self.state.lock().clips.get(&clip).cloned()
    }

    pub fn open_clips(&self) -> usize {
        self.state.lock().clips.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn fail_next_start(&self) {
        self.state.lock().fail_next_start = true;
    }

    /// Deliver an event to every subscriber, as the backend's notifier would
    pub fn emit(&self, event: BackendEvent) {
        let listeners: Vec<_> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener.on_backend_event(event.clone());
        }
    }

    /// Simulate the clip playing through to its last frame
    pub fn finish(&self, clip: ClipId) {
        if let Some(state) = self.state.lock().clips.get_mut(&clip) {
            state.playing = false;
        }
        self.emit(BackendEvent::ReachedEnd { clip });
    }

    fn with_clip<T>(&self, clip: ClipId, call: Call, f: impl FnOnce(&mut MockClip) -> T) -> Result<T> {
        let mut state = self.state.lock();
        state.calls.push(call);
        state
            .clips
            .get_mut(&clip)
            .map(f)
            .ok_or(AudioError::UnknownClip(clip.0))
    }
}

impl AudioBackend for MockBackend {
    fn open(&self, path: &Path) -> Result<ClipId> {
        let mut state = self.state.lock();
        state.calls.push(Call::Open(path.to_path_buf()));

        let name = path.to_string_lossy();
        let is_wav = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("wav"))
            .unwrap_or(false);
        if name.contains("corrupt") || !is_wav {
            return Err(AudioError::BackendUnavailable(format!("cannot decode {}", name)));
        }

        state.next_clip += 1;
        let clip = ClipId(state.next_clip);
        state.clips.insert(clip, MockClip::default());
        Ok(clip)
    }

    fn start(&self, clip: ClipId) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.fail_next_start {
                state.fail_next_start = false;
                state.calls.push(Call::Start(clip));
                return Err(AudioError::PlaybackError("device went away".to_string()));
            }
        }
        self.with_clip(clip, Call::Start(clip), |c| c.playing = true)?;
        self.emit(BackendEvent::Started { clip });
        Ok(())
    }

    fn stop(&self, clip: ClipId) -> Result<()> {
        self.with_clip(clip, Call::Stop(clip), |c| c.playing = false)?;
        self.emit(BackendEvent::Stopped { clip });
        Ok(())
    }

    fn close(&self, clip: ClipId) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::Close(clip));
        state
            .clips
            .remove(&clip)
            .map(|_| ())
            .ok_or(AudioError::UnknownClip(clip.0))
    }

    fn set_position_to_start(&self, clip: ClipId) -> Result<()> {
        self.with_clip(clip, Call::Rewind(clip), |_| ())
    }

    fn set_loop(&self, clip: ClipId, enabled: bool) -> Result<()> {
        self.with_clip(clip, Call::SetLoop(clip, enabled), |c| c.looping = enabled)
    }

    fn set_gain_db(&self, clip: ClipId, db: f32) -> Result<()> {
        self.with_clip(clip, Call::SetGain(clip, db), |c| c.gain_db = Some(db))
    }

    fn subscribe(&self, listener: Arc<dyn BackendListener>) -> SubscriptionId {
        let id = {
            let mut state = self.state.lock();
            state.next_subscription += 1;
            SubscriptionId(state.next_subscription)
        };
        self.listeners.lock().push((id, listener));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.lock().retain(|(existing, _)| *existing != id);
    }
}

/// Callback that records every event it sees
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<CallbackEvent>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<CallbackEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, wanted: &CallbackEvent) -> usize {
        self.events.lock().iter().filter(|e| *e == wanted).count()
    }
}

impl PlayerCallback for Recorder {
    fn on_event(&self, event: CallbackEvent) {
        self.events.lock().push(event);
    }
}
