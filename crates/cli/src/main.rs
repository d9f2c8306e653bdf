// wavdeck: play audio files from the console

mod args;
mod commands;
mod player;
mod playlist;

use args::Args;
use clap::Parser;
use parking_lot::Mutex;
use player::{ConsolePlayer, Flow, Input};
use playlist::Playlist;
use std::io::BufRead;
use std::process::ExitCode;
use std::sync::{mpsc, Arc, Once};
use std::thread;
use wavdeck_backend_cpal::CpalBackend;
use wavdeck_core::{CallbackEvent, PlaybackController, PlayerCallback, Result};

static INIT_LOGGER: Once = Once::new();

fn init_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Info)
            .parse_default_env()
            .try_init();
    });
}

/// Forwards controller events into the main loop
struct ChannelCallback {
    sender: Mutex<mpsc::Sender<Input>>,
}

impl PlayerCallback for ChannelCallback {
    fn on_event(&self, event: CallbackEvent) {
        let _ = self.sender.lock().send(Input::Event(event));
    }
}

fn spawn_stdin_reader(sender: mpsc::Sender<Input>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if sender.send(Input::Line(line)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
        log::debug!("stdin closed");
    });
}

fn run(args: Args) -> Result<()> {
    let config = args.controller_config();
    config.validate()?;

    let backend = Arc::new(CpalBackend::new()?);
    let controller = PlaybackController::new(backend, config)?;

    let (sender, receiver) = mpsc::channel();
    controller.add_callback(Arc::new(ChannelCallback {
        sender: Mutex::new(sender.clone()),
    }));

    let mut player = ConsolePlayer::new(controller, Playlist::new(args.files), args.looping);
    if player.start()? == Flow::Quit {
        return player.exit();
    }
    println!("{}", commands::HELP);
    spawn_stdin_reader(sender);

    for input in receiver {
        if player.handle_input(input)? == Flow::Quit {
            break;
        }
    }

    player.exit()
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
