// Speaker playback via cpal of a fully decoded recording

use anyhow::{bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::backend::{PlaybackDevice, PlaybackStream};
use super::convert;
use super::file::AudioFile;

/// Default output device of the default cpal host
pub struct CpalPlaybackDevice {
    host: cpal::Host,
}

impl CpalPlaybackDevice {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }
}

impl Default for CpalPlaybackDevice {
    fn default() -> Self {
        Self::new()
    }
}

/// Decoded samples plus the read position of the output callback
struct PlaybackCursor {
    samples: Vec<f32>,
    position: AtomicUsize,
    /// Set by the stream error callback; the cursor will not advance again
    failed: AtomicBool,
}

impl PlaybackCursor {
    fn new(samples: Vec<f32>) -> Self {
        Self {
            samples,
            position: AtomicUsize::new(0),
            failed: AtomicBool::new(false),
        }
    }

    fn fill<T>(&self, out: &mut [T])
    where
        T: Sample + FromSample<f32>,
    {
        let start = self.position.load(Ordering::Acquire).min(self.samples.len());
        let available = &self.samples[start..];
        let n = available.len().min(out.len());

        for (slot, &sample) in out.iter_mut().zip(available) {
            *slot = sample.to_sample::<T>();
        }
        // Silence once the recording is exhausted
        out[n..].iter_mut().for_each(|s| *s = T::EQUILIBRIUM);

        self.position.store(start + n, Ordering::Release);
    }

    fn fail(&self) {
        self.failed.store(true, Ordering::Release);
    }

    fn is_finished(&self) -> bool {
        self.failed.load(Ordering::Acquire)
            || self.position.load(Ordering::Acquire) >= self.samples.len()
    }
}

fn is_usable_format(format: SampleFormat) -> bool {
    matches!(
        format,
        SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16
    )
}

/// The recording's own rate and layout if the device takes them, else the device default
fn find_output_config(
    device: &cpal::Device,
    rate: u32,
    channels: u16,
) -> Result<cpal::SupportedStreamConfig> {
    let native = device.supported_output_configs().ok().and_then(|mut ranges| {
        ranges
            .find(|range| {
                is_usable_format(range.sample_format())
                    && range.channels() == channels
                    && range.min_sample_rate().0 <= rate
                    && rate <= range.max_sample_rate().0
            })
            .map(|range| range.with_sample_rate(cpal::SampleRate(rate)))
    });

    match native {
        Some(config) => Ok(config),
        None => device
            .default_output_config()
            .context("Output device has no usable config"),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    cursor: Arc<PlaybackCursor>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let callback_cursor = Arc::clone(&cursor);
    let err_fn = move |err: cpal::StreamError| {
        error!("Playback stream error: {}", err);
        cursor.fail();
    };

    let stream = device.build_output_stream(
        config,
        move |out: &mut [T], _: &cpal::OutputCallbackInfo| callback_cursor.fill(out),
        err_fn,
        None,
    )?;

    Ok(stream)
}

impl PlaybackDevice for CpalPlaybackDevice {
    fn open(&self, path: &Path) -> Result<Box<dyn PlaybackStream>> {
        let audio = AudioFile::open(path)?;

        let device = self
            .host
            .default_output_device()
            .context("No output device available")?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let supported = find_output_config(&device, audio.sample_rate, audio.channels)
            .with_context(|| format!("Cannot configure {}", device_name))?;
        let device_rate = supported.sample_rate().0;
        let device_channels = supported.channels();
        let sample_format = supported.sample_format();
        let config = supported.config();

        if device_rate != audio.sample_rate || device_channels != audio.channels {
            warn!(
                "{} doesn't take {}Hz/{}ch, converting to {}Hz/{}ch",
                device_name, audio.sample_rate, audio.channels, device_rate, device_channels
            );
        }

        let samples = convert::resample(
            &audio.samples,
            audio.sample_rate,
            device_rate,
            audio.channels,
        )?;
        let samples = convert::remix(&samples, audio.channels, device_channels);
        let cursor = Arc::new(PlaybackCursor::new(convert::i16_to_f32(&samples)));

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, Arc::clone(&cursor)),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, Arc::clone(&cursor)),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, Arc::clone(&cursor)),
            other => bail!("Unsupported output sample format: {:?}", other),
        }
        .with_context(|| {
            format!(
                "Failed to open output stream on {} ({}Hz, {} channels)",
                device_name, device_rate, device_channels
            )
        })?;

        info!(
            "Playback prepared on {}: {} ({:.1}s)",
            device_name,
            path.display(),
            audio.duration_seconds
        );

        Ok(Box::new(CpalPlaybackStream {
            stream,
            cursor,
            path: path.to_path_buf(),
        }))
    }

    fn name(&self) -> &str {
        "cpal speaker"
    }
}

struct CpalPlaybackStream {
    stream: cpal::Stream,
    cursor: Arc<PlaybackCursor>,
    path: PathBuf,
}

impl PlaybackStream for CpalPlaybackStream {
    fn start(&mut self) -> Result<()> {
        self.stream.play().context("Failed to start output stream")?;
        info!("Playback started: {}", self.path.display());
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.cursor.is_finished()
    }
}

impl Drop for CpalPlaybackStream {
    fn drop(&mut self) {
        debug!("Releasing playback stream for {}", self.path.display());
    }
}
