// Transport state shared between the controller and backend notifications

use crate::backend::ClipId;
use crate::error::{AudioError, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// Player state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// No clip open
    Idle,
    /// Clip is playing
    Playing,
    /// Clip is open but halted
    Paused,
    /// Clip reached its end; it stays open until the next play, stop or exit
    Stopped,
}

impl PlayerState {
    /// Whether a clip is running (playing or paused)
    pub fn is_running(self) -> bool {
        matches!(self, PlayerState::Playing | PlayerState::Paused)
    }
}

/// Snapshot of the controller for display
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStatus {
    pub state: PlayerState,
    /// Logical volume (0.0 - 1.0), 0.0 while muted
    pub volume: f32,
    pub muted: bool,
    pub looping: bool,
    pub user_stopped: bool,
}

/// A completed state change and the clip it concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub old_state: PlayerState,
    pub new_state: PlayerState,
    pub clip: ClipId,
}

#[derive(Debug)]
struct Transport {
    state: PlayerState,
    clip: Option<ClipId>,
    user_stopped: bool,
}

/// Thread-safe transport state container
///
/// Every method is a single critical section, so a foreground call and a
/// backend notification racing each other resolve to exactly one winner.
#[derive(Clone)]
pub struct PlayerStateContainer {
    inner: Arc<Mutex<Transport>>,
}

impl PlayerStateContainer {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Transport {
                state: PlayerState::Idle,
                clip: None,
                user_stopped: false,
            })),
        }
    }

    pub fn get_state(&self) -> PlayerState {
        self.inner.lock().state
    }

    pub fn clip(&self) -> Option<ClipId> {
        self.inner.lock().clip
    }

    pub fn user_stopped(&self) -> bool {
        self.inner.lock().user_stopped
    }

    /// Enter Playing with a freshly opened clip.
    ///
    /// Returns the clip left over from a natural completion, if any; the caller
    /// owns closing it.
    pub fn begin(&self, clip: ClipId) -> Result<Option<ClipId>> {
        let mut transport = self.inner.lock();
        if transport.state.is_running() {
            return Err(AudioError::PlaybackError(format!(
                "Cannot start clip {} while {:?}",
                clip, transport.state
            )));
        }
        let lingering = transport.clip.replace(clip);
        transport.state = PlayerState::Playing;
        log::debug!("Player state changed to: {:?} (clip {})", transport.state, clip);
        Ok(lingering)
    }

    /// Undo a `begin` whose start call failed, putting back the clip it displaced
    pub fn abort(&self, clip: ClipId, lingering: Option<ClipId>) {
        let mut transport = self.inner.lock();
        if transport.clip == Some(clip) {
            transport.clip = lingering;
            transport.state = if lingering.is_some() {
                PlayerState::Stopped
            } else {
                PlayerState::Idle
            };
            log::debug!("Player state changed to: {:?} (clip {} aborted)", transport.state, clip);
        }
    }

    pub fn clear_user_stopped(&self) {
        self.inner.lock().user_stopped = false;
    }

    /// Move between two states that both hold the clip, e.g. Playing -> Paused
    pub fn transition(&self, from: PlayerState, to: PlayerState) -> Result<Transition> {
        let mut transport = self.inner.lock();
        if transport.state != from {
            return Err(match from {
                PlayerState::Paused => AudioError::NotPaused,
                _ => AudioError::NotPlaying,
            });
        }
        validate_transition(from, to)?;
        let clip = transport.clip.ok_or(AudioError::NotPlaying)?;
        transport.state = to;
        log::debug!("Player state changed to: {:?}", to);
        Ok(Transition {
            old_state: from,
            new_state: to,
            clip,
        })
    }

    /// User stop: take the clip and return to Idle.
    ///
    /// Fails with `NotPlaying` when there is nothing to release.
    pub fn release(&self) -> Result<Transition> {
        let mut transport = self.inner.lock();
        let clip = transport.clip.take().ok_or(AudioError::NotPlaying)?;
        let old_state = transport.state;
        if old_state.is_running() {
            transport.user_stopped = true;
        }
        transport.state = PlayerState::Idle;
        log::debug!("Player state changed to: Idle (released clip {})", clip);
        Ok(Transition {
            old_state,
            new_state: PlayerState::Idle,
            clip,
        })
    }

    /// Playback ended without a user stop: the clip ran out or its output
    /// failed.
    ///
    /// Only a Playing transport for the same clip completes; everything else
    /// (a pause or stop that already won, a stale clip) is ignored.
    pub fn complete(&self, clip: ClipId) -> Option<Transition> {
        let mut transport = self.inner.lock();
        if transport.state != PlayerState::Playing || transport.clip != Some(clip) {
            return None;
        }
        transport.state = PlayerState::Stopped;
        log::debug!("Player state changed to: Stopped (clip {} completed)", clip);
        Some(Transition {
            old_state: PlayerState::Playing,
            new_state: PlayerState::Stopped,
            clip,
        })
    }
}

impl Default for PlayerStateContainer {
    fn default() -> Self {
        Self::new()
    }
}

/// Check a transition against the transport state machine
pub fn validate_transition(from: PlayerState, to: PlayerState) -> Result<()> {
    match (from, to) {
        (PlayerState::Idle, PlayerState::Playing) => Ok(()),

        (PlayerState::Playing, PlayerState::Paused) => Ok(()),
        (PlayerState::Playing, PlayerState::Stopped) => Ok(()),
        (PlayerState::Playing, PlayerState::Idle) => Ok(()),

        (PlayerState::Paused, PlayerState::Playing) => Ok(()),
        (PlayerState::Paused, PlayerState::Idle) => Ok(()),

        (PlayerState::Stopped, PlayerState::Idle) => Ok(()),
        (PlayerState::Stopped, PlayerState::Playing) => Ok(()),

        _ => Err(AudioError::PlaybackError(format!(
            "Invalid state transition from {:?} to {:?}",
            from, to
        ))),
    }
}
