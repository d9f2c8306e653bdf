// Command line and environment configuration

use clap::Parser;
use std::path::PathBuf;
use wavdeck_core::{AudioFormat, ControllerConfig, DEFAULT_VOLUME};

#[derive(Debug, Parser)]
#[command(name = "wavdeck", version, about = "Console player for WAV clips")]
pub struct Args {
    /// Files to play, in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Initial volume between 0.0 and 1.0
    #[arg(long, env = "WAVDECK_VOLUME", default_value_t = DEFAULT_VOLUME)]
    pub volume: f32,

    /// Format to accept: wav, aiff or flac
    #[arg(long, env = "WAVDECK_FORMAT", default_value = "wav")]
    pub format: AudioFormat,

    /// Loop each file until told otherwise
    #[arg(long = "loop")]
    pub looping: bool,
}

impl Args {
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig::default()
            .with_volume(self.volume)
            .with_format(self.format)
    }
}
