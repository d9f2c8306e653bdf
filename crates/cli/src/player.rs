// Console player: drives the controller from stdin commands and playback events

use crate::commands::{step_volume, Command, HELP};
use crate::playlist::Playlist;
use wavdeck_core::{AudioError, CallbackEvent, PlaybackController, PlayerState, Result};

/// Anything the main loop reacts to
#[derive(Debug)]
pub enum Input {
    Line(String),
    Event(CallbackEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct ConsolePlayer {
    controller: PlaybackController,
    playlist: Playlist,
    loop_on_start: bool,
}

impl ConsolePlayer {
    pub fn new(controller: PlaybackController, playlist: Playlist, loop_on_start: bool) -> Self {
        Self {
            controller,
            playlist,
            loop_on_start,
        }
    }

    /// Start at the first playable file. Returns `Quit` when there is none.
    pub fn start(&mut self) -> Result<Flow> {
        self.play_from(0)
    }

    pub fn handle_input(&mut self, input: Input) -> Result<Flow> {
        match input {
            Input::Line(line) => match crate::commands::parse_command(&line) {
                Ok(command) => self.handle_command(command),
                Err(crate::commands::CommandError::Empty) => Ok(Flow::Continue),
                Err(e) => {
                    println!("{}", e);
                    Ok(Flow::Continue)
                }
            },
            Input::Event(event) => self.handle_event(event),
        }
    }

    pub fn exit(mut self) -> Result<()> {
        self.controller.exit()
    }

    fn handle_command(&mut self, command: Command) -> Result<Flow> {
        let outcome = match command {
            Command::Pause => self.controller.pause(),
            Command::Resume => self.controller.resume(),
            Command::Stop => self.controller.stop(),
            Command::Next => {
                let candidates: Vec<usize> = self
                    .playlist
                    .forward_from(self.playlist.current_index() + 1)
                    .collect();
                return self.skip_to(candidates);
            }
            Command::Previous => {
                let current = self.playlist.current_index();
                // Nothing playable before the current file: restart it
                let candidates: Vec<usize> = self
                    .playlist
                    .backward_from(self.playlist.previous_index())
                    .chain((current > 0).then_some(current))
                    .collect();
                return self.skip_to(candidates);
            }
            Command::ToggleLoop => self.controller.toggle_loop().map(|looping| {
                println!("loop {}", if looping { "on" } else { "off" });
            }),
            Command::ToggleMute => self.controller.toggle_mute().map(|muted| {
                println!("{}", if muted { "muted" } else { "unmuted" });
            }),
            Command::VolumeUp | Command::VolumeDown => {
                let base = if self.controller.is_muted() {
                    0.0
                } else {
                    self.controller.volume()
                };
                let volume = step_volume(base, command == Command::VolumeUp);
                self.set_volume(volume)
            }
            Command::SetVolume(volume) => self.set_volume(volume),
            Command::Status => {
                self.print_status();
                Ok(())
            }
            Command::Help => {
                println!("{}", HELP);
                Ok(())
            }
            Command::Quit => return Ok(Flow::Quit),
        };

        match outcome {
            Ok(()) => Ok(Flow::Continue),
            // Wrong-state and bad-input errors are reported, not fatal
            Err(e @ (AudioError::NotPlaying | AudioError::NotPaused | AudioError::InvalidVolume(_))) => {
                println!("{}", e);
                Ok(Flow::Continue)
            }
            Err(e) => Err(e),
        }
    }

    fn handle_event(&mut self, event: CallbackEvent) -> Result<Flow> {
        match event {
            CallbackEvent::PlaybackCompleted => {
                // A skip may already have started the next file
                if self.controller.state() != PlayerState::Stopped {
                    return Ok(Flow::Continue);
                }
                self.play_from(self.playlist.current_index() + 1)
            }
            CallbackEvent::Error { message } => {
                println!("playback error: {}", message);
                Ok(Flow::Continue)
            }
            CallbackEvent::VolumeChanged { volume } => {
                println!("volume {:.0}%", volume * 100.0);
                Ok(Flow::Continue)
            }
            _ => Ok(Flow::Continue),
        }
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.controller.set_volume(volume)
    }

    fn skip_to(&mut self, candidates: Vec<usize>) -> Result<Flow> {
        match self.controller.stop() {
            Ok(()) | Err(AudioError::NotPlaying) => {}
            Err(e) => log::warn!("Stop before skip failed: {}", e),
        }
        self.play_first(candidates)
    }

    /// Play the first file at or after `start` that the controller accepts
    fn play_from(&mut self, start: usize) -> Result<Flow> {
        let candidates: Vec<usize> = self.playlist.forward_from(start).collect();
        self.play_first(candidates)
    }

    /// Play the first of `candidates` that the controller accepts
    fn play_first(&mut self, candidates: Vec<usize>) -> Result<Flow> {
        for index in candidates {
            let Some(path) = self.playlist.get(index).map(|p| p.to_path_buf()) else {
                break;
            };

            if !self.controller.is_supported_file(&path) {
                log::warn!(
                    "Skipping {}: not a {} file",
                    path.display(),
                    self.controller.format()
                );
                continue;
            }

            match self.controller.play(&path) {
                Ok(()) => {
                    self.playlist.set_current(index);
                    println!(
                        "[{}/{}] playing {}",
                        index + 1,
                        self.playlist.len(),
                        path.display()
                    );
                    if self.loop_on_start && !self.controller.is_looping() {
                        self.controller.toggle_loop()?;
                    }
                    return Ok(Flow::Continue);
                }
                Err(AudioError::BackendUnavailable(reason)) => {
                    log::warn!("Skipping {}: {}", path.display(), reason);
                }
                Err(e) => return Err(e),
            }
        }

        println!("end of playlist");
        Ok(Flow::Quit)
    }

    fn print_status(&self) {
        let status = self.controller.status();
        let file = self
            .playlist
            .current()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!(
            "{:?} {} | volume {:.0}%{} | loop {}",
            status.state,
            file,
            status.volume * 100.0,
            if status.muted { " (muted)" } else { "" },
            if status.looping { "on" } else { "off" }
        );
    }
}
