// Decoded clip data and the playback cursor the output callback reads through

use std::sync::Arc;

/// Fully decoded audio, interleaved f32
#[derive(Debug, Clone)]
pub struct DecodedClip {
    samples: Arc<[f32]>,
    channels: u16,
    sample_rate: u32,
}

impl DecodedClip {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            channels: channels.max(1),
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.frames() as u64 * 1000) / self.sample_rate as u64
    }
}

/// What one render call produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOutcome {
    /// Samples taken from the clip; the rest of the buffer is silence
    pub written: usize,
    /// The clip ran out during this call. Reported once per start.
    pub reached_end: bool,
}

/// Read position, loop flag and gain for one clip
#[derive(Debug)]
pub struct ClipCursor {
    clip: DecodedClip,
    frame: usize,
    looping: bool,
    amplitude: f32,
    end_reported: bool,
}

impl ClipCursor {
    pub fn new(clip: DecodedClip) -> Self {
        Self {
            clip,
            frame: 0,
            looping: false,
            amplitude: 1.0,
            end_reported: false,
        }
    }

    pub fn clip(&self) -> &DecodedClip {
        &self.clip
    }

    #[cfg(test)]
    fn position_frames(&self) -> usize {
        self.frame
    }

    pub fn rewind(&mut self) {
        self.frame = 0;
        self.end_reported = false;
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude;
    }

    /// Allow the end to be reported again after a restart
    pub fn arm(&mut self) {
        self.end_reported = false;
    }

    /// Fill `out` (interleaved, same channel count as the clip)
    pub fn render(&mut self, out: &mut [f32]) -> RenderOutcome {
        let channels = self.clip.channels() as usize;
        let frames = self.clip.frames();
        let samples = self.clip.samples();
        let mut written = 0;

        while written < out.len() {
            if self.frame >= frames {
                if self.looping && frames > 0 {
                    self.frame = 0;
                } else {
                    break;
                }
            }

            let start = self.frame * channels;
            let available = samples.len() - start;
            let wanted = (out.len() - written) / channels * channels;
            let count = available.min(wanted);
            if count == 0 {
                break;
            }

            let src = &samples[start..start + count];
            let dst = &mut out[written..written + count];
            if (self.amplitude - 1.0).abs() > f32::EPSILON {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d = s * self.amplitude;
                }
            } else {
                dst.copy_from_slice(src);
            }

            written += count;
            self.frame += count / channels;
        }

        out[written..].fill(0.0);

        let reached_end = !self.looping && self.frame >= frames && !self.end_reported;
        if reached_end {
            self.end_reported = true;
        }
        RenderOutcome {
            written,
            reached_end,
        }
    }
}
