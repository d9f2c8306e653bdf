// Transport behaviour of PlaybackController against a scripted backend

mod common;

use common::{Call, MockBackend, Recorder};
use std::thread;
use wavdeck_core::{
    AudioError, BackendEvent, CallbackEvent, ClipId, ControllerConfig, PlaybackController,
    PlayerState, MIN_GAIN_DB,
};

fn controller(backend: &std::sync::Arc<MockBackend>) -> PlaybackController {
    PlaybackController::with_backend(backend.clone()).unwrap()
}

#[test]
fn play_opens_clip_applies_gain_and_starts() {
    let backend = MockBackend::new();
    let recorder = Recorder::new();
    let mut player = controller(&backend);
    player.add_callback(recorder.clone());

    player.play("song.wav").unwrap();

    assert!(player.is_running());
    assert_eq!(player.state(), PlayerState::Playing);
    let clip = player.clip().unwrap();
    let state = backend.clip(clip).unwrap();
    assert!(state.playing);
    let expected_db = 20.0 * 0.5_f32.log10();
    assert!((state.gain_db.unwrap() - expected_db).abs() < 1e-4);
    assert_eq!(
        recorder.events(),
        vec![
            CallbackEvent::StateChanged {
                old_state: PlayerState::Idle,
                new_state: PlayerState::Playing,
            },
            CallbackEvent::Started,
        ]
    );
}

#[test]
fn play_while_running_is_ignored() {
    let backend = MockBackend::new();
    let mut player = controller(&backend);
    player.play("first.wav").unwrap();
    let clip = player.clip();

    player.play("second.wav").unwrap();
    player.pause().unwrap();
    player.play("third.wav").unwrap();

    assert_eq!(player.clip(), clip);
    assert_eq!(backend.open_clips(), 1);
    let opens = backend
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Open(_)))
        .count();
    assert_eq!(opens, 1);
}

#[test]
fn play_corrupt_file_reports_backend_unavailable() {
    let backend = MockBackend::new();
    let recorder = Recorder::new();
    let mut player = controller(&backend);
    player.add_callback(recorder.clone());

    let err = player.play("corrupt.wav").unwrap_err();
    assert!(matches!(err, AudioError::BackendUnavailable(_)));
    let err = player.play("song.mp3").unwrap_err();
    assert!(matches!(err, AudioError::BackendUnavailable(_)));

    assert!(!player.is_running());
    assert_eq!(player.state(), PlayerState::Idle);
    assert_eq!(player.clip(), None);
    assert!(recorder.events().is_empty());
}

#[test]
fn play_pause_resume_stop_ends_idle_and_released() {
    let backend = MockBackend::new();
    let recorder = Recorder::new();
    let mut player = controller(&backend);
    player.add_callback(recorder.clone());

    player.play("song.wav").unwrap();
    let clip = player.clip().unwrap();

    player.pause().unwrap();
    assert!(player.is_paused());
    assert!(player.is_running());
    assert!(!backend.clip(clip).unwrap().playing);

    player.resume().unwrap();
    assert!(!player.is_paused());
    assert!(backend.clip(clip).unwrap().playing);

    player.stop().unwrap();
    assert_eq!(player.state(), PlayerState::Idle);
    assert!(!player.is_running());
    assert_eq!(player.clip(), None);
    assert!(player.was_user_stopped());
    assert_eq!(backend.open_clips(), 0);

    let tail: Vec<_> = backend.calls().into_iter().rev().take(3).collect();
    assert_eq!(tail, vec![Call::Close(clip), Call::Stop(clip), Call::Rewind(clip)]);

    assert_eq!(recorder.count(&CallbackEvent::Stopped), 1);
    assert_eq!(recorder.count(&CallbackEvent::PlaybackCompleted), 0);
}

#[test]
fn wrong_state_calls_return_errors() {
    let backend = MockBackend::new();
    let mut player = controller(&backend);

    assert_eq!(player.stop(), Err(AudioError::NotPlaying));
    assert_eq!(player.pause(), Err(AudioError::NotPlaying));
    assert_eq!(player.resume(), Err(AudioError::NotPaused));
    assert_eq!(player.toggle_loop(), Err(AudioError::NotPlaying));

    player.play("song.wav").unwrap();
    assert_eq!(player.resume(), Err(AudioError::NotPaused));
    player.pause().unwrap();
    assert_eq!(player.pause(), Err(AudioError::NotPlaying));
    assert_eq!(player.state(), PlayerState::Paused);
}

#[test]
fn toggle_loop_twice_restores_looping() {
    let backend = MockBackend::new();
    let recorder = Recorder::new();
    let mut player = controller(&backend);
    player.add_callback(recorder.clone());
    player.play("song.wav").unwrap();
    let clip = player.clip().unwrap();

    assert_eq!(player.toggle_loop(), Ok(true));
    assert!(backend.clip(clip).unwrap().looping);
    assert_eq!(player.toggle_loop(), Ok(false));
    assert!(!backend.clip(clip).unwrap().looping);
    assert!(!player.is_looping());

    assert_eq!(recorder.count(&CallbackEvent::LoopChanged { looping: true }), 1);
    assert_eq!(recorder.count(&CallbackEvent::LoopChanged { looping: false }), 1);
}

#[test]
fn toggle_loop_works_while_paused_and_carries_into_next_play() {
    let backend = MockBackend::new();
    let mut player = controller(&backend);
    player.play("one.wav").unwrap();
    player.pause().unwrap();
    assert_eq!(player.toggle_loop(), Ok(true));
    player.stop().unwrap();

    player.play("two.wav").unwrap();
    let clip = player.clip().unwrap();
    assert!(backend.clip(clip).unwrap().looping);
}

#[test]
fn toggle_mute_twice_restores_volume() {
    let backend = MockBackend::new();
    let mut player = controller(&backend);
    player.play("song.wav").unwrap();
    player.set_volume(0.8).unwrap();
    let clip = player.clip().unwrap();

    assert_eq!(player.toggle_mute(), Ok(true));
    assert!(player.is_muted());
    assert_eq!(player.volume(), 0.0);
    assert_eq!(backend.clip(clip).unwrap().gain_db, Some(MIN_GAIN_DB));

    assert_eq!(player.toggle_mute(), Ok(false));
    assert!(!player.is_muted());
    assert_eq!(player.volume(), 0.8);
    let db = backend.clip(clip).unwrap().gain_db.unwrap();
    assert!((db - 20.0 * 0.8_f32.log10()).abs() < 1e-4);
}

#[test]
fn set_volume_applies_gain_without_restarting_transport() {
    let backend = MockBackend::new();
    let mut player = controller(&backend);
    player.play("song.wav").unwrap();
    let clip = player.clip().unwrap();
    backend.clear_calls();

    player.set_volume(1.0).unwrap();
    player.set_volume(0.0).unwrap();

    assert_eq!(
        backend.calls(),
        vec![Call::SetGain(clip, 0.0), Call::SetGain(clip, MIN_GAIN_DB)]
    );
    assert!(player.is_running());
}

#[test]
fn set_volume_rejects_out_of_range() {
    let backend = MockBackend::new();
    let recorder = Recorder::new();
    let mut player = controller(&backend);
    player.add_callback(recorder.clone());
    player.play("song.wav").unwrap();
    backend.clear_calls();

    assert_eq!(player.set_volume(1.5), Err(AudioError::InvalidVolume(1.5)));
    assert_eq!(player.set_volume(-0.1), Err(AudioError::InvalidVolume(-0.1)));
    assert!(matches!(
        player.set_volume(f32::NAN),
        Err(AudioError::InvalidVolume(_))
    ));

    assert_eq!(player.volume(), 0.5);
    assert!(backend.calls().is_empty());
    assert!(!recorder
        .events()
        .iter()
        .any(|e| matches!(e, CallbackEvent::VolumeChanged { .. })));
}

#[test]
fn set_volume_while_muted_ends_mute() {
    let backend = MockBackend::new();
    let mut player = controller(&backend);
    player.toggle_mute().unwrap();
    assert!(player.is_muted());

    player.set_volume(0.3).unwrap();
    assert!(!player.is_muted());
    assert_eq!(player.volume(), 0.3);

    // Next toggle mutes again rather than restoring the stale level
    assert_eq!(player.toggle_mute(), Ok(true));
    player.toggle_mute().unwrap();
    assert_eq!(player.volume(), 0.3);
}

#[test]
fn volume_set_while_idle_applies_on_play() {
    let backend = MockBackend::new();
    let mut player = controller(&backend);
    player.set_volume(1.0).unwrap();
    assert!(backend.calls().is_empty());

    player.play("song.wav").unwrap();
    let clip = player.clip().unwrap();
    assert_eq!(backend.clip(clip).unwrap().gain_db, Some(0.0));
}

#[test]
fn muted_play_starts_silent() {
    let backend = MockBackend::new();
    let mut player = controller(&backend);
    player.toggle_mute().unwrap();
    player.play("song.wav").unwrap();
    let clip = player.clip().unwrap();
    assert_eq!(backend.clip(clip).unwrap().gain_db, Some(MIN_GAIN_DB));
}

#[test]
fn supported_file_check_uses_configured_format() {
    let backend = MockBackend::new();
    let player = controller(&backend);
    assert!(player.is_supported_file("song.wav"));
    assert!(player.is_supported_file("SONG.WAV"));
    assert!(!player.is_supported_file("song.mp3"));

    let flac = PlaybackController::new(
        backend.clone(),
        ControllerConfig::default().with_format("flac".parse().unwrap()),
    )
    .unwrap();
    assert!(flac.is_supported_file("track.FLAC"));
    assert!(!flac.is_supported_file("song.wav"));
}

#[test]
fn invalid_config_is_rejected() {
    let backend = MockBackend::new();
    let result = PlaybackController::new(
        backend.clone(),
        ControllerConfig::default().with_volume(-1.0),
    );
    assert!(matches!(result, Err(AudioError::InvalidConfig(_))));
    assert_eq!(backend.listener_count(), 0);
}

#[test]
fn natural_completion_fires_once_without_stop() {
    let backend = MockBackend::new();
    let recorder = Recorder::new();
    let mut player = controller(&backend);
    player.add_callback(recorder.clone());
    player.play("song.wav").unwrap();
    let clip = player.clip().unwrap();

    let notifier = {
        let backend = backend.clone();
        thread::spawn(move || {
            backend.finish(clip);
            backend.finish(clip);
        })
    };
    notifier.join().unwrap();

    assert!(!player.is_running());
    assert_eq!(player.state(), PlayerState::Stopped);
    assert!(!player.was_user_stopped());
    assert_eq!(recorder.count(&CallbackEvent::PlaybackCompleted), 1);
    assert_eq!(
        recorder.count(&CallbackEvent::StateChanged {
            old_state: PlayerState::Playing,
            new_state: PlayerState::Stopped,
        }),
        1
    );
    assert_eq!(recorder.count(&CallbackEvent::Stopped), 0);
}

#[test]
fn completion_while_paused_or_for_stale_clip_is_ignored() {
    let backend = MockBackend::new();
    let recorder = Recorder::new();
    let mut player = controller(&backend);
    player.add_callback(recorder.clone());

    player.play("one.wav").unwrap();
    let first = player.clip().unwrap();
    player.pause().unwrap();
    backend.finish(first);
    assert_eq!(player.state(), PlayerState::Paused);

    player.stop().unwrap();
    player.play("two.wav").unwrap();
    backend.finish(first);
    backend.finish(ClipId(999));
    assert_eq!(player.state(), PlayerState::Playing);
    assert_eq!(recorder.count(&CallbackEvent::PlaybackCompleted), 0);
}

#[test]
fn completed_clip_is_released_by_next_play_or_stop() {
    let backend = MockBackend::new();
    let recorder = Recorder::new();
    let mut player = controller(&backend);
    player.add_callback(recorder.clone());

    player.play("one.wav").unwrap();
    let first = player.clip().unwrap();
    backend.finish(first);
    assert_eq!(player.clip(), Some(first));
    assert_eq!(backend.open_clips(), 1);

    player.play("two.wav").unwrap();
    let second = player.clip().unwrap();
    assert_ne!(first, second);
    assert!(backend.clip(first).is_none());
    assert_eq!(backend.open_clips(), 1);

    backend.finish(second);
    player.stop().unwrap();
    assert_eq!(player.state(), PlayerState::Idle);
    assert_eq!(backend.open_clips(), 0);
    // Releasing a finished clip is not a user stop of running playback
    assert_eq!(recorder.count(&CallbackEvent::Stopped), 0);
}

#[test]
fn failed_start_leaves_prior_state() {
    let backend = MockBackend::new();
    let mut player = controller(&backend);

    backend.fail_next_start();
    assert!(matches!(player.play("song.wav"), Err(AudioError::PlaybackError(_))));
    assert_eq!(player.state(), PlayerState::Idle);
    assert_eq!(backend.open_clips(), 0);

    player.play("one.wav").unwrap();
    let first = player.clip().unwrap();
    backend.finish(first);
    backend.fail_next_start();
    assert!(player.play("two.wav").is_err());
    assert_eq!(player.state(), PlayerState::Stopped);
    assert_eq!(player.clip(), Some(first));
    assert_eq!(backend.open_clips(), 1);
}

#[test]
fn failed_resume_stays_paused() {
    let backend = MockBackend::new();
    let mut player = controller(&backend);
    player.play("song.wav").unwrap();
    player.pause().unwrap();

    backend.fail_next_start();
    assert!(player.resume().is_err());
    assert_eq!(player.state(), PlayerState::Paused);
    player.resume().unwrap();
    assert_eq!(player.state(), PlayerState::Playing);
}

#[test]
fn exit_is_idempotent_and_drop_unsubscribes() {
    let backend = MockBackend::new();
    let mut player = controller(&backend);
    assert_eq!(backend.listener_count(), 1);

    player.exit().unwrap();
    player.play("song.wav").unwrap();
    player.exit().unwrap();
    player.exit().unwrap();
    assert_eq!(backend.open_clips(), 0);

    player.play("song.wav").unwrap();
    drop(player);
    assert_eq!(backend.open_clips(), 0);
    assert_eq!(backend.listener_count(), 0);
}

#[test]
fn status_reflects_transport() {
    let backend = MockBackend::new();
    let mut player = controller(&backend);
    player.play("song.wav").unwrap();
    player.toggle_loop().unwrap();
    player.toggle_mute().unwrap();

    let status = player.status();
    assert_eq!(status.state, PlayerState::Playing);
    assert!(status.looping);
    assert!(status.muted);
    assert_eq!(status.volume, 0.0);
    assert!(!status.user_stopped);
}

#[test]
fn backend_error_while_playing_ends_running() {
    let backend = MockBackend::new();
    let recorder = Recorder::new();
    let mut player = controller(&backend);
    player.add_callback(recorder.clone());
    player.play("song.wav").unwrap();
    let clip = player.clip().unwrap();

    backend.emit(BackendEvent::Error {
        clip,
        message: "device unplugged".to_string(),
    });
    backend.emit(BackendEvent::Stopped { clip });

    assert!(!player.is_running());
    assert_eq!(player.state(), PlayerState::Stopped);
    assert!(!player.was_user_stopped());
    assert_eq!(
        recorder.count(&CallbackEvent::Error {
            message: "device unplugged".to_string(),
        }),
        1
    );
    assert_eq!(recorder.count(&CallbackEvent::PlaybackCompleted), 1);

    // The failed clip is released like a finished one
    player.play("next.wav").unwrap();
    assert!(backend.clip(clip).is_none());
    assert_eq!(player.state(), PlayerState::Playing);
}

#[test]
fn backend_error_while_paused_or_for_stale_clip_keeps_state() {
    let backend = MockBackend::new();
    let recorder = Recorder::new();
    let mut player = controller(&backend);
    player.add_callback(recorder.clone());

    player.play("one.wav").unwrap();
    let first = player.clip().unwrap();
    player.pause().unwrap();
    backend.emit(BackendEvent::Error {
        clip: first,
        message: "underrun".to_string(),
    });
    assert_eq!(player.state(), PlayerState::Paused);

    player.stop().unwrap();
    player.play("two.wav").unwrap();
    backend.emit(BackendEvent::Error {
        clip: first,
        message: "late".to_string(),
    });
    assert_eq!(player.state(), PlayerState::Playing);
    assert_eq!(recorder.count(&CallbackEvent::PlaybackCompleted), 0);
    assert_eq!(
        recorder.count(&CallbackEvent::Error {
            message: "late".to_string(),
        }),
        0
    );
}

#[test]
fn pause_notification_after_resume_does_not_end_running() {
    let backend = MockBackend::new();
    let mut player = controller(&backend);
    player.play("song.wav").unwrap();
    let clip = player.clip().unwrap();
    player.pause().unwrap();
    player.resume().unwrap();

    // A Stopped notice from the pause delivered late
    backend.emit(BackendEvent::Stopped { clip });
    assert_eq!(player.state(), PlayerState::Playing);
}
