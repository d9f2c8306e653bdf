// Console commands read from stdin

use thiserror::Error;

/// Step applied by `+` and `-`
pub const VOLUME_STEP: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Pause,
    Resume,
    Stop,
    Next,
    Previous,
    ToggleLoop,
    ToggleMute,
    VolumeUp,
    VolumeDown,
    SetVolume(f32),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', type h for help")]
    Unknown(String),
    #[error("expected a volume such as 'v 0.5', got '{0}'")]
    BadVolume(String),
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let mut parts = line.split_whitespace();
    let verb = parts.next().ok_or(CommandError::Empty)?;

    let command = match verb.to_ascii_lowercase().as_str() {
        "p" | "pause" => Command::Pause,
        "r" | "resume" => Command::Resume,
        "s" | "stop" => Command::Stop,
        "n" | "next" => Command::Next,
        "b" | "prev" | "previous" => Command::Previous,
        "l" | "loop" => Command::ToggleLoop,
        "m" | "mute" => Command::ToggleMute,
        "+" => Command::VolumeUp,
        "-" => Command::VolumeDown,
        "v" | "volume" => {
            let raw = parts.next().unwrap_or("");
            let volume = raw
                .parse::<f32>()
                .map_err(|_| CommandError::BadVolume(raw.to_string()))?;
            Command::SetVolume(volume)
        }
        "i" | "info" | "status" => Command::Status,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(command)
}

/// Volume after one `+`/`-` step, kept on the 0.1 grid and inside [0, 1]
pub fn step_volume(current: f32, up: bool) -> f32 {
    let delta = if up { VOLUME_STEP } else { -VOLUME_STEP };
    (((current + delta) * 10.0).round() / 10.0).clamp(0.0, 1.0)
}

pub const HELP: &str = "\
commands:
  p  pause          r  resume        s  stop
  n  next file      b  previous      l  toggle loop
  m  toggle mute    +  volume up     -  volume down
  v <0..1>  set volume              i  status
  h  help           q  quit";
