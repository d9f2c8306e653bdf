// Transport controller for a single clip

use crate::backend::{AudioBackend, BackendEvent, BackendListener, ClipId, SubscriptionId};
use crate::callback::{CallbackEvent, CallbackManager, PlayerCallback};
use crate::config::ControllerConfig;
use crate::error::{AudioError, Result};
use crate::format::AudioFormat;
use crate::gain::{is_valid_volume, volume_to_db};
use crate::state::{PlaybackStatus, PlayerState, PlayerStateContainer, Transition};
use std::path::Path;
use std::sync::Arc;

/// Plays one clip at a time through an `AudioBackend`.
///
/// Transport calls take `&mut self` and are expected from a single caller
/// context. Completion notices arrive from the backend's own thread and are
/// reconciled through the shared [`PlayerStateContainer`].
pub struct PlaybackController {
    backend: Arc<dyn AudioBackend>,
    config: ControllerConfig,
    transport: PlayerStateContainer,
    callback_manager: Arc<CallbackManager>,
    subscription: SubscriptionId,
    volume: f32,
    /// Volume to restore on unmute; `Some` exactly while muted
    saved_volume: Option<f32>,
    looping: bool,
}

impl PlaybackController {
    pub fn new(backend: Arc<dyn AudioBackend>, config: ControllerConfig) -> Result<Self> {
        config.validate()?;

        let transport = PlayerStateContainer::new();
        let callback_manager = Arc::new(CallbackManager::new());
        let listener = Arc::new(TransportListener {
            transport: transport.clone(),
            callback_manager: callback_manager.clone(),
        });
        let subscription = backend.subscribe(listener);

        log::info!(
            "Playback controller ready ({} files, volume {})",
            config.format,
            config.default_volume
        );

        Ok(Self {
            backend,
            config,
            transport,
            callback_manager,
            subscription,
            volume: config.default_volume,
            saved_volume: None,
            looping: false,
        })
    }

    /// Controller with the default configuration (WAV, volume 0.5)
    pub fn with_backend(backend: Arc<dyn AudioBackend>) -> Result<Self> {
        Self::new(backend, ControllerConfig::default())
    }

    pub fn add_callback(&self, callback: Arc<dyn PlayerCallback>) {
        self.callback_manager.add_callback(callback);
    }

    pub fn clear_callbacks(&self) {
        self.callback_manager.clear_callbacks();
    }

    /// Open `path` and start playing it.
    ///
    /// Ignored while a clip is playing or paused. On failure the controller
    /// keeps its previous state.
    ///
    /// `StateChanged` and `Started` are dispatched after the backend starts the
    /// clip. Completion arrives on the backend's thread, so a clip shorter than
    /// the output latency may report `PlaybackCompleted` before `Started`.
    pub fn play(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let old_state = self.transport.get_state();
        if old_state.is_running() {
            log::debug!("Ignoring play of {} while {:?}", path.display(), old_state);
            return Ok(());
        }

        log::info!("Playing {}", path.display());
        let clip = self.backend.open(path).map_err(|e| {
            log::error!("Failed to open {}: {}", path.display(), e);
            e
        })?;

        if let Err(e) = self.configure_clip(clip) {
            log::error!("Failed to configure clip {}: {}", clip, e);
            self.close_quietly(clip);
            return Err(e);
        }

        let lingering = match self.transport.begin(clip) {
            Ok(lingering) => lingering,
            Err(e) => {
                self.close_quietly(clip);
                return Err(e);
            }
        };

        if let Err(e) = self.backend.start(clip) {
            log::error!("Failed to start clip {}: {}", clip, e);
            self.transport.abort(clip, lingering);
            self.close_quietly(clip);
            return Err(e);
        }
        self.transport.clear_user_stopped();

        if let Some(previous) = lingering {
            self.close_quietly(previous);
        }

        self.notify_transition(old_state, PlayerState::Playing);
        self.callback_manager.dispatch_event(CallbackEvent::Started);
        Ok(())
    }

    /// Rewind, halt and release the open clip.
    ///
    /// Returns `NotPlaying` when no clip is open.
    pub fn stop(&mut self) -> Result<()> {
        let transition = self.transport.release()?;
        log::info!("Stopping playback (clip {})", transition.clip);

        let result = self.shutdown_clip(transition.clip);
        if let Err(ref e) = result {
            log::warn!("Error while releasing clip {}: {}", transition.clip, e);
        }

        self.notify(transition);
        if transition.old_state.is_running() {
            self.callback_manager.dispatch_event(CallbackEvent::Stopped);
        }
        result
    }

    /// Halt playback, keeping the clip and its position
    pub fn pause(&mut self) -> Result<()> {
        let transition = self
            .transport
            .transition(PlayerState::Playing, PlayerState::Paused)?;

        if let Err(e) = self.backend.stop(transition.clip) {
            log::error!("Failed to pause clip {}: {}", transition.clip, e);
            if let Err(rollback) = self
                .transport
                .transition(PlayerState::Paused, PlayerState::Playing)
            {
                log::warn!("Could not restore Playing after failed pause: {}", rollback);
            }
            return Err(e);
        }

        log::info!("Playback paused");
        self.notify(transition);
        Ok(())
    }

    /// Continue a paused clip from where it halted
    pub fn resume(&mut self) -> Result<()> {
        let transition = self
            .transport
            .transition(PlayerState::Paused, PlayerState::Playing)?;

        if let Err(e) = self.backend.start(transition.clip) {
            log::error!("Failed to resume clip {}: {}", transition.clip, e);
            if let Err(rollback) = self
                .transport
                .transition(PlayerState::Playing, PlayerState::Paused)
            {
                log::warn!("Could not restore Paused after failed resume: {}", rollback);
            }
            return Err(e);
        }

        log::info!("Playback resumed");
        self.notify(transition);
        Ok(())
    }

    /// Flip looping for the open clip. Returns the new looping flag.
    pub fn toggle_loop(&mut self) -> Result<bool> {
        let clip = self.running_clip()?;
        let looping = !self.looping;
        self.backend.set_loop(clip, looping)?;
        self.looping = looping;

        log::info!("Looping {}", if looping { "enabled" } else { "disabled" });
        self.callback_manager
            .dispatch_event(CallbackEvent::LoopChanged { looping });
        Ok(looping)
    }

    /// Mute or unmute. Returns the new muted flag.
    pub fn toggle_mute(&mut self) -> Result<bool> {
        match self.saved_volume {
            None => {
                self.apply_gain(0.0)?;
                self.saved_volume = Some(self.volume);
                self.volume = 0.0;
            }
            Some(previous) => {
                self.apply_gain(previous)?;
                self.saved_volume = None;
                self.volume = previous;
            }
        }

        let muted = self.is_muted();
        log::info!("{}", if muted { "Muted" } else { "Unmuted" });
        self.callback_manager
            .dispatch_event(CallbackEvent::MuteChanged { muted });
        self.callback_manager.dispatch_event(CallbackEvent::VolumeChanged {
            volume: self.volume,
        });
        Ok(muted)
    }

    /// Logical volume, 0.0 while muted
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Set the logical volume and apply it to the open clip.
    ///
    /// Values outside [0.0, 1.0] are rejected without any state change.
    /// Setting a volume while muted ends the mute.
    pub fn set_volume(&mut self, volume: f32) -> Result<()> {
        if !is_valid_volume(volume) {
            log::warn!("Volume must be between 0 and 1, volume = {}", volume);
            return Err(AudioError::InvalidVolume(volume));
        }

        self.apply_gain(volume)?;
        self.volume = volume;
        log::debug!("Volume set to {}", volume);

        if self.saved_volume.take().is_some() {
            self.callback_manager
                .dispatch_event(CallbackEvent::MuteChanged { muted: false });
        }
        self.callback_manager
            .dispatch_event(CallbackEvent::VolumeChanged { volume });
        Ok(())
    }

    /// Whether `path` has this controller's file extension
    pub fn is_supported_file(&self, path: impl AsRef<Path>) -> bool {
        self.config.format.matches(path.as_ref())
    }

    /// Stop and release everything. Safe to call repeatedly.
    pub fn exit(&mut self) -> Result<()> {
        match self.stop() {
            Ok(()) | Err(AudioError::NotPlaying) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn state(&self) -> PlayerState {
        self.transport.get_state()
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.state() == PlayerState::Paused
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn is_muted(&self) -> bool {
        self.saved_volume.is_some()
    }

    pub fn was_user_stopped(&self) -> bool {
        self.transport.user_stopped()
    }

    /// Clip currently held open, if any
    pub fn clip(&self) -> Option<ClipId> {
        self.transport.clip()
    }

    pub fn format(&self) -> AudioFormat {
        self.config.format
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            state: self.state(),
            volume: self.volume,
            muted: self.is_muted(),
            looping: self.looping,
            user_stopped: self.was_user_stopped(),
        }
    }

    fn running_clip(&self) -> Result<ClipId> {
        if !self.is_running() {
            return Err(AudioError::NotPlaying);
        }
        self.transport.clip().ok_or(AudioError::NotPlaying)
    }

    fn configure_clip(&self, clip: ClipId) -> Result<()> {
        self.backend.set_gain_db(clip, self.gain_db(self.volume))?;
        if self.looping {
            self.backend.set_loop(clip, true)?;
        }
        Ok(())
    }

    fn apply_gain(&self, volume: f32) -> Result<()> {
        match self.transport.clip() {
            Some(clip) => self.backend.set_gain_db(clip, self.gain_db(volume)),
            None => Ok(()),
        }
    }

    fn gain_db(&self, volume: f32) -> f32 {
        volume_to_db(volume, self.backend.min_gain_db())
    }

    fn shutdown_clip(&self, clip: ClipId) -> Result<()> {
        let rewind = self.backend.set_position_to_start(clip);
        let halt = self.backend.stop(clip);
        let close = self.backend.close(clip);
        rewind.and(halt).and(close)
    }

    fn close_quietly(&self, clip: ClipId) {
        if let Err(e) = self.backend.close(clip) {
            log::warn!("Failed to close clip {}: {}", clip, e);
        }
    }

    fn notify(&self, transition: Transition) {
        self.notify_transition(transition.old_state, transition.new_state);
    }

    fn notify_transition(&self, old_state: PlayerState, new_state: PlayerState) {
        self.callback_manager.dispatch_event(CallbackEvent::StateChanged {
            old_state,
            new_state,
        });
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if let Err(e) = self.exit() {
            log::warn!("Error while dropping controller: {}", e);
        }
        self.backend.unsubscribe(self.subscription);
    }
}

/// Persistent backend subscription owned by one controller
struct TransportListener {
    transport: PlayerStateContainer,
    callback_manager: Arc<CallbackManager>,
}

impl BackendListener for TransportListener {
    fn on_backend_event(&self, event: BackendEvent) {
        match event {
            BackendEvent::ReachedEnd { clip } => {
                if !self.finish(clip) {
                    log::debug!("Ignoring end of clip {}", clip);
                }
            }
            BackendEvent::Error { clip, message } => {
                if self.transport.clip() != Some(clip) {
                    log::debug!("Ignoring error on stale clip {}: {}", clip, message);
                    return;
                }
                log::error!("Backend error on clip {}: {}", clip, message);
                self.callback_manager
                    .dispatch_event(CallbackEvent::Error { message });
                // The stream is gone; a playing clip will not report its end
                self.finish(clip);
            }
            // Explicit starts and stops are the controller's own doing
            other => log::debug!("Backend event: {:?}", other),
        }
    }
}

impl TransportListener {
    /// Playing -> Stopped for `clip`. Returns whether this call won the transition.
    fn finish(&self, clip: ClipId) -> bool {
        match self.transport.complete(clip) {
            Some(transition) => {
                log::info!("Playback completed (clip {})", clip);
                self.callback_manager.dispatch_event(CallbackEvent::StateChanged {
                    old_state: transition.old_state,
                    new_state: transition.new_state,
                });
                self.callback_manager
                    .dispatch_event(CallbackEvent::PlaybackCompleted);
                true
            }
            None => false,
        }
    }
}
