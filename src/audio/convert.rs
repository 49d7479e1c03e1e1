// Sample conversion helpers shared by capture and playback

use anyhow::{bail, Context, Result};
use rubato::{FftFixedIn, Resampler};

/// Input frames handed to the resampler per pass
const RESAMPLE_CHUNK: usize = 1024;

/// Fold interleaved frames of `from_channels` into `to_channels`
///
/// Downmixing averages input channels into each output sample; upmixing
/// repeats the input channels across the outputs.
pub fn remix(samples: &[i16], from_channels: u16, to_channels: u16) -> Vec<i16> {
    if from_channels == 0 || to_channels == 0 || to_channels == from_channels {
        return samples.to_vec();
    }

    let from = from_channels as usize;
    let to = to_channels as usize;
    let mut out = Vec::with_capacity(samples.len() / from * to);

    for frame in samples.chunks_exact(from) {
        if to > from {
            out.extend((0..to).map(|ch| frame[ch % from]));
        } else {
            // Output k averages inputs [k*from/to, (k+1)*from/to), so every
            // input lands in exactly one output
            for k in 0..to {
                out.push(average(&frame[k * from / to..(k + 1) * from / to]));
            }
        }
    }

    out
}

fn average(samples: &[i16]) -> i16 {
    let sum: i32 = samples.iter().map(|&s| s as i32).sum();
    (sum / samples.len() as i32).clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Convert 16-bit PCM to the float range used by output devices
pub fn i16_to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32768.0).collect()
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32768.0)
        .round()
        .clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Streaming sample-rate converter for interleaved 16-bit PCM
///
/// Input is buffered until a full resampler chunk is available. The filter
/// delay is trimmed from the front and `flush` trims padding from the back,
/// so the total output is `frames_in * to_rate / from_rate` frames.
pub struct RateConverter {
    resampler: FftFixedIn<f32>,
    channels: usize,
    from_rate: u32,
    to_rate: u32,
    pending: Vec<Vec<f32>>,
    delay: usize,
    frames_in: u64,
    frames_out: u64,
}

impl RateConverter {
    pub fn new(from_rate: u32, to_rate: u32, channels: u16) -> Result<Self> {
        if from_rate == 0 || to_rate == 0 || channels == 0 {
            bail!(
                "Invalid resampler parameters: {}Hz -> {}Hz, {} channels",
                from_rate,
                to_rate,
                channels
            );
        }

        let channels = channels as usize;
        let resampler = FftFixedIn::<f32>::new(
            from_rate as usize,
            to_rate as usize,
            RESAMPLE_CHUNK,
            1,
            channels,
        )
        .with_context(|| format!("Failed to create resampler {}Hz -> {}Hz", from_rate, to_rate))?;
        let delay = resampler.output_delay();

        Ok(Self {
            resampler,
            channels,
            from_rate,
            to_rate,
            pending: vec![Vec::new(); channels],
            delay,
            frames_in: 0,
            frames_out: 0,
        })
    }

    /// Feed interleaved samples; returns whatever the resampler produced
    pub fn process(&mut self, samples: &[i16]) -> Result<Vec<i16>> {
        for frame in samples.chunks_exact(self.channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                self.pending[ch].push(sample as f32 / 32768.0);
            }
            self.frames_in += 1;
        }

        let mut out = Vec::new();
        loop {
            let needed = self.resampler.input_frames_next();
            if self.pending[0].len() < needed {
                break;
            }
            let chunk: Vec<Vec<f32>> = self
                .pending
                .iter_mut()
                .map(|ch| ch.drain(..needed).collect())
                .collect();
            let resampled = self
                .resampler
                .process(&chunk[..], None)
                .context("Resampling failed")?;
            self.emit(&resampled, &mut out);
        }

        Ok(out)
    }

    /// Drain the buffered tail and the filter delay
    pub fn flush(&mut self) -> Result<Vec<i16>> {
        let expected = self.frames_in * self.to_rate as u64 / self.from_rate as u64;
        let mut out = Vec::new();

        let pending = std::mem::replace(&mut self.pending, vec![Vec::new(); self.channels]);
        if !pending[0].is_empty() {
            let resampled = self
                .resampler
                .process_partial(Some(&pending[..]), None)
                .context("Resampling failed")?;
            self.emit(&resampled, &mut out);
        }

        while self.frames_out < expected {
            let resampled = self
                .resampler
                .process_partial::<Vec<f32>>(None, None)
                .context("Resampling failed")?;
            if resampled.first().map_or(true, |ch| ch.is_empty()) {
                break;
            }
            self.emit(&resampled, &mut out);
        }

        let surplus =
            (self.frames_out.saturating_sub(expected) as usize).min(out.len() / self.channels);
        out.truncate(out.len() - surplus * self.channels);
        self.frames_out -= surplus as u64;

        Ok(out)
    }

    fn emit(&mut self, resampled: &[Vec<f32>], out: &mut Vec<i16>) {
        let frames = resampled.first().map_or(0, |ch| ch.len());
        for i in 0..frames {
            if self.delay > 0 {
                self.delay -= 1;
                continue;
            }
            out.extend(resampled.iter().map(|ch| f32_to_i16(ch[i])));
            self.frames_out += 1;
        }
    }
}

/// Resample a whole interleaved buffer at once
pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32, channels: u16) -> Result<Vec<i16>> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }

    let mut converter = RateConverter::new(from_rate, to_rate, channels)?;
    let mut out = converter.process(samples)?;
    out.extend(converter.flush()?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_to_mono_averages() {
        let stereo = vec![100, 300, -200, 200, 1000, 0];
        assert_eq!(remix(&stereo, 2, 1), vec![200, 0, 500]);
    }

    #[test]
    fn test_mono_passthrough() {
        let mono = vec![1, 2, 3];
        assert_eq!(remix(&mono, 1, 1), mono);
    }

    #[test]
    fn test_mono_to_stereo_duplicates() {
        let mono = vec![5, 6];
        assert_eq!(remix(&mono, 1, 2), vec![5, 5, 6, 6]);
    }

    #[test]
    fn test_extremes_do_not_overflow() {
        let stereo = vec![i16::MAX, i16::MAX, i16::MIN, i16::MIN];
        assert_eq!(remix(&stereo, 2, 1), vec![i16::MAX, i16::MIN]);
    }

    #[test]
    fn test_quad_to_stereo_pairs_channels() {
        let quad = vec![10, 20, 30, 50];
        assert_eq!(remix(&quad, 4, 2), vec![15, 40]);
    }

    #[test]
    fn test_uneven_downmix_keeps_every_channel() {
        let three = vec![100, 200, 900, 0, 0, 300];
        assert_eq!(remix(&three, 3, 2), vec![100, 550, 0, 150]);
    }

    #[test]
    fn test_trailing_partial_frame_dropped() {
        let stereo = vec![10, 20, 30];
        assert_eq!(remix(&stereo, 2, 1), vec![15]);
    }

    #[test]
    fn test_i16_to_f32_range() {
        let out = i16_to_f32(&[0, i16::MIN, 16384]);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], -1.0);
        assert!((out[2] - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_resample_same_rate_passthrough() -> Result<()> {
        let samples = vec![1, 2, 3, 4];
        assert_eq!(resample(&samples, 16000, 16000, 2)?, samples);
        Ok(())
    }

    #[test]
    fn test_resample_down_keeps_duration() -> Result<()> {
        let samples = vec![8000i16; 4800];

        let out = resample(&samples, 48000, 16000, 1)?;

        assert_eq!(out.len(), 1600);
        // A constant signal stays constant away from the edges
        for &s in &out[400..1200] {
            assert!((s as i32 - 8000).abs() < 200, "Sample drifted: {}", s);
        }
        Ok(())
    }

    #[test]
    fn test_resample_up_stereo_keeps_duration() -> Result<()> {
        let samples = vec![0i16; 16000 * 2];

        let out = resample(&samples, 16000, 44100, 2)?;

        assert_eq!(out.len(), 44100 * 2);
        Ok(())
    }

    #[test]
    fn test_streaming_matches_whole_buffer_length() -> Result<()> {
        let samples = vec![1000i16; 4800];
        let mut converter = RateConverter::new(48000, 16000, 1)?;

        let mut out = Vec::new();
        for piece in samples.chunks(480) {
            out.extend(converter.process(piece)?);
        }
        out.extend(converter.flush()?);

        assert_eq!(out.len(), resample(&samples, 48000, 16000, 1)?.len());
        Ok(())
    }
}
