// cpal-based audio backend
// One output stream per open clip, fed from the clip's decoded samples

use crate::clip::ClipCursor;
use crate::decoder;
use crate::notifier::Notifier;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use wavdeck_core::gain::db_to_amplitude;
use wavdeck_core::{
    AudioBackend, AudioError, BackendEvent, BackendListener, ClipId, Result, SubscriptionId,
    MIN_GAIN_DB,
};

struct ClipSlot {
    stream: Stream,
    cursor: Arc<Mutex<ClipCursor>>,
    is_playing: Arc<AtomicBool>,
}

/// Backend playing decoded clips on the default output device
pub struct CpalBackend {
    device: Device,
    clips: Mutex<HashMap<ClipId, ClipSlot>>,
    next_clip: AtomicU64,
    notifier: Notifier,
}

impl CpalBackend {
    pub fn new() -> Result<Self> {
        log::info!("Initializing cpal audio backend");

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::DeviceError("No output device available".to_string()))?;

        log::info!(
            "Using audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        Ok(Self {
            device,
            clips: Mutex::new(HashMap::new()),
            next_clip: AtomicU64::new(1),
            notifier: Notifier::new()?,
        })
    }

    fn build_stream(
        &self,
        clip: ClipId,
        cursor: Arc<Mutex<ClipCursor>>,
        is_playing: Arc<AtomicBool>,
    ) -> Result<Stream> {
        let (channels, sample_rate) = {
            let cursor = cursor.lock();
            (cursor.clip().channels(), cursor.clip().sample_rate())
        };

        let config = StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };
        log::debug!("Stream config for clip {}: {:?}", clip, config);

        let events = self.notifier.sender()?;
        let error_events = events.clone();
        let error_playing = is_playing.clone();

        let stream = self
            .device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !is_playing.load(Ordering::Acquire) {
                        // Fill with silence
                        data.fill(0.0);
                        return;
                    }

                    let outcome = cursor.lock().render(data);
                    if outcome.reached_end {
                        is_playing.store(false, Ordering::Release);
                        let _ = events.send(BackendEvent::ReachedEnd { clip });
                    }
                },
                move |err| {
                    log::error!("Audio stream error: {}", err);
                    error_playing.store(false, Ordering::Release);
                    let _ = error_events.send(BackendEvent::Error {
                        clip,
                        message: err.to_string(),
                    });
                },
                None,
            )
            .map_err(|e| {
                AudioError::BackendUnavailable(format!("Failed to build output stream: {}", e))
            })?;

        Ok(stream)
    }

    fn with_slot<T>(&self, clip: ClipId, f: impl FnOnce(&ClipSlot) -> T) -> Result<T> {
        let clips = self.clips.lock();
        clips.get(&clip).map(f).ok_or(AudioError::UnknownClip(clip.0))
    }
}

// SAFETY: cpal::Stream is !Send on some hosts because it must not be driven
// from several threads at once. Every stream lives inside `clips` and is only
// touched while that mutex is held, and the notifier thread never sees one.
unsafe impl Send for CpalBackend {}
unsafe impl Sync for CpalBackend {}

impl AudioBackend for CpalBackend {
    fn open(&self, path: &Path) -> Result<ClipId> {
        let decoded = decoder::decode_file(path)?;
        let clip = ClipId(self.next_clip.fetch_add(1, Ordering::Relaxed));

        let cursor = Arc::new(Mutex::new(ClipCursor::new(decoded)));
        let is_playing = Arc::new(AtomicBool::new(false));
        let stream = self.build_stream(clip, cursor.clone(), is_playing.clone())?;

        self.clips.lock().insert(
            clip,
            ClipSlot {
                stream,
                cursor,
                is_playing,
            },
        );
        log::info!("Opened clip {} from {}", clip, path.display());
        Ok(clip)
    }

    fn start(&self, clip: ClipId) -> Result<()> {
        self.with_slot(clip, |slot| {
            slot.cursor.lock().arm();
            slot.is_playing.store(true, Ordering::Release);
            slot.stream.play().map_err(|e| {
                slot.is_playing.store(false, Ordering::Release);
                AudioError::PlaybackError(format!("Failed to start stream: {}", e))
            })
        })??;

        self.notifier.post(BackendEvent::Started { clip });
        Ok(())
    }

    fn stop(&self, clip: ClipId) -> Result<()> {
        self.with_slot(clip, |slot| {
            slot.is_playing.store(false, Ordering::Release);
            slot.stream
                .pause()
                .map_err(|e| AudioError::PlaybackError(format!("Failed to stop stream: {}", e)))
        })??;

        self.notifier.post(BackendEvent::Stopped { clip });
        Ok(())
    }

    fn close(&self, clip: ClipId) -> Result<()> {
        let slot = self
            .clips
            .lock()
            .remove(&clip)
            .ok_or(AudioError::UnknownClip(clip.0))?;
        slot.is_playing.store(false, Ordering::Release);
        drop(slot);
        log::info!("Closed clip {}", clip);
        Ok(())
    }

    fn set_position_to_start(&self, clip: ClipId) -> Result<()> {
        self.with_slot(clip, |slot| slot.cursor.lock().rewind())
    }

    fn set_loop(&self, clip: ClipId, enabled: bool) -> Result<()> {
        self.with_slot(clip, |slot| slot.cursor.lock().set_looping(enabled))
    }

    fn set_gain_db(&self, clip: ClipId, db: f32) -> Result<()> {
        let amplitude = db_to_amplitude(db, MIN_GAIN_DB);
        log::debug!("Clip {} gain {} dB (x{})", clip, db, amplitude);
        self.with_slot(clip, |slot| slot.cursor.lock().set_amplitude(amplitude))
    }

    fn subscribe(&self, listener: Arc<dyn BackendListener>) -> SubscriptionId {
        self.notifier.subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.notifier.unsubscribe(id);
    }
}

impl Drop for CpalBackend {
    fn drop(&mut self) {
        // Streams hold notifier senders; drop them before joining the notifier
        self.clips.lock().clear();
        self.notifier.shutdown();
    }
}
