// Whole-file decoding using Symphonia
// A clip is decoded up front so start/stop/rewind/loop never touch the file again

use crate::clip::DecodedClip;
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use wavdeck_core::{AudioError, Result};

/// Decode every packet of the default track of `path` into interleaved f32 samples
pub fn decode_file(path: &Path) -> Result<DecodedClip> {
    let file = File::open(path).map_err(|e| {
        AudioError::BackendUnavailable(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let media_source_stream = MediaSourceStream::new(Box::new(file), Default::default());
    let hint = create_hint_from_path(path);

    // Probe the media source
    let probe_result = symphonia::default::get_probe()
        .format(
            &hint,
            media_source_stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::BackendUnavailable(format!("Failed to probe media: {}", e)))?;

    let mut format_reader = probe_result.format;

    let track = format_reader
        .default_track()
        .ok_or_else(|| AudioError::BackendUnavailable("No default track found".to_string()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::BackendUnavailable(format!("Failed to create decoder: {}", e)))?;

    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buffer: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break; // End of stream
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(AudioError::BackendUnavailable(format!(
                    "Failed to read packet: {}",
                    e
                )));
            }
        };

        // Skip packets that don't belong to our track
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Skipping corrupt packet in {}: {}", path.display(), e);
                continue;
            }
            Err(e) => {
                return Err(AudioError::BackendUnavailable(format!(
                    "Failed to decode packet: {}",
                    e
                )));
            }
        };

        let signal_spec = *decoded.spec();
        sample_rate = signal_spec.rate;
        channels = signal_spec.channels.count() as u16;

        let buffer = sample_buffer
            .get_or_insert_with(|| SampleBuffer::new(decoded.capacity() as u64, signal_spec));
        if buffer.capacity() < decoded.capacity() * signal_spec.channels.count() {
            *buffer = SampleBuffer::new(decoded.capacity() as u64, signal_spec);
        }
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    if sample_rate == 0 || channels == 0 {
        return Err(AudioError::BackendUnavailable(format!(
            "No audio decoded from {}",
            path.display()
        )));
    }

    let clip = DecodedClip::new(samples, channels, sample_rate);
    log::info!(
        "Decoded {}: {}Hz, {} channels, {} ms",
        path.display(),
        clip.sample_rate(),
        clip.channels(),
        clip.duration_ms()
    );
    Ok(clip)
}

/// Create a hint from file path
fn create_hint_from_path(path: &Path) -> Hint {
    let mut hint = Hint::new();
    if let Some(ext_str) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext_str);
    }
    hint
}
