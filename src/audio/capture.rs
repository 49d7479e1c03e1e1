// Microphone capture via cpal, written straight to a WAV file

use anyhow::{bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

use super::backend::{CaptureDevice, CaptureStream, EncodingProfile};
use super::convert::{self, RateConverter};

/// Where the input callback sends converted samples
struct CaptureSink {
    wav: Option<hound::WavWriter<BufWriter<File>>>,
    /// Present when the device runs at a different rate than the file
    converter: Option<RateConverter>,
}

type SharedSink = Arc<Mutex<CaptureSink>>;

/// A panicking callback must not cost us the file
fn lock_sink(sink: &SharedSink) -> MutexGuard<'_, CaptureSink> {
    sink.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CaptureSink {
    fn new(converter: Option<RateConverter>) -> Self {
        Self {
            wav: None,
            converter,
        }
    }

    fn write(&mut self, samples: &[i16]) -> Result<()> {
        let Some(wav) = self.wav.as_mut() else {
            return Ok(());
        };

        let resampled;
        let samples = match self.converter.as_mut() {
            Some(converter) => {
                resampled = converter.process(samples)?;
                &resampled[..]
            }
            None => samples,
        };

        for &sample in samples {
            wav.write_sample(sample)
                .context("Failed to write sample to WAV")?;
        }
        Ok(())
    }

    /// Flush the resampler tail and write the header; returns samples written
    fn finalize(&mut self) -> Result<u32> {
        let Some(mut wav) = self.wav.take() else {
            return Ok(0);
        };

        if let Some(converter) = self.converter.as_mut() {
            match converter.flush() {
                Ok(tail) => {
                    for sample in tail {
                        wav.write_sample(sample)
                            .context("Failed to write sample to WAV")?;
                    }
                }
                Err(e) => warn!("Dropping resampler tail: {:#}", e),
            }
        }

        let samples = wav.len();
        wav.finalize().context("Failed to finalize WAV file")?;
        Ok(samples)
    }
}

/// Default input device of the default cpal host
pub struct CpalCaptureDevice {
    host: cpal::Host,
}

impl CpalCaptureDevice {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// Whether the host exposes a microphone at all
    pub fn is_available(&self) -> bool {
        self.host.default_input_device().is_some()
    }
}

impl Default for CpalCaptureDevice {
    fn default() -> Self {
        Self::new()
    }
}

fn is_usable_format(format: SampleFormat) -> bool {
    matches!(
        format,
        SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16
    )
}

/// A device config that runs at `rate` natively, if the device has one
fn find_input_config(device: &cpal::Device, rate: u32) -> Option<cpal::SupportedStreamConfig> {
    device
        .supported_input_configs()
        .ok()?
        .filter(|range| is_usable_format(range.sample_format()))
        .find(|range| range.min_sample_rate().0 <= rate && rate <= range.max_sample_rate().0)
        .map(|range| range.with_sample_rate(cpal::SampleRate(rate)))
}

impl CaptureDevice for CpalCaptureDevice {
    fn open(&self, output: &Path, profile: &EncodingProfile) -> Result<Box<dyn CaptureStream>> {
        let device = self
            .host
            .default_input_device()
            .context("No input device available")?;

        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());
        let supported = match find_input_config(&device, profile.sample_rate) {
            Some(config) => config,
            None => {
                let config = device.default_input_config().with_context(|| {
                    format!("Input device {} has no usable config", device_name)
                })?;
                warn!(
                    "{} doesn't support {}Hz, resampling from {}Hz",
                    device_name,
                    profile.sample_rate,
                    config.sample_rate().0
                );
                config
            }
        };

        let device_rate = supported.sample_rate().0;
        let device_channels = supported.channels();
        let sample_format = supported.sample_format();
        let config = supported.config();

        let converter = if device_rate != profile.sample_rate {
            Some(RateConverter::new(
                device_rate,
                profile.sample_rate,
                profile.channels,
            )?)
        } else {
            None
        };

        // The writer is attached only after the stream exists, so a device
        // that refuses the config leaves nothing on disk.
        let sink: SharedSink = Arc::new(Mutex::new(CaptureSink::new(converter)));

        let stream = match sample_format {
            SampleFormat::F32 => {
                build_stream::<f32>(&device, &config, profile.channels, Arc::clone(&sink))
            }
            SampleFormat::I16 => {
                build_stream::<i16>(&device, &config, profile.channels, Arc::clone(&sink))
            }
            SampleFormat::U16 => {
                build_stream::<u16>(&device, &config, profile.channels, Arc::clone(&sink))
            }
            other => bail!("Unsupported input sample format: {:?}", other),
        }
        .with_context(|| {
            format!(
                "Failed to open input stream on {} ({}Hz, {} channels)",
                device_name, device_rate, device_channels
            )
        })?;

        let wav = hound::WavWriter::create(output, profile.wav_spec())
            .with_context(|| format!("Failed to create WAV file: {:?}", output))?;
        lock_sink(&sink).wav = Some(wav);

        info!(
            "Capture acquired on {} ({}Hz -> {}Hz, {} -> {} channels) -> {}",
            device_name,
            device_rate,
            profile.sample_rate,
            device_channels,
            profile.channels,
            output.display()
        );

        Ok(Box::new(CpalCaptureStream {
            stream: Some(stream),
            sink,
            path: output.to_path_buf(),
        }))
    }

    fn name(&self) -> &str {
        "cpal microphone"
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    target_channels: u16,
    sink: SharedSink,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    let device_channels = config.channels;
    let err_fn = |err: cpal::StreamError| error!("Capture stream error: {}", err);

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let samples: Vec<i16> = data.iter().map(|&s| s.to_sample::<i16>()).collect();
            let samples = convert::remix(&samples, device_channels, target_channels);

            if let Err(e) = lock_sink(&sink).write(&samples) {
                error!("Capture write failed: {:#}", e);
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

struct CpalCaptureStream {
    stream: Option<cpal::Stream>,
    sink: SharedSink,
    path: PathBuf,
}

impl CpalCaptureStream {
    fn release(&mut self) -> Result<u32> {
        // Dropping the stream stops the callbacks before the header is written
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                debug!("Pausing capture stream failed: {}", e);
            }
            drop(stream);
        }

        lock_sink(&self.sink).finalize()
    }
}

impl CaptureStream for CpalCaptureStream {
    fn start(&mut self) -> Result<()> {
        let stream = self.stream.as_ref().context("Capture stream already released")?;
        stream.play().context("Failed to start input stream")?;
        info!("Capture started: {}", self.path.display());
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        let samples = self.release()?;
        info!(
            "Capture finished: {} ({} samples)",
            self.path.display(),
            samples
        );
        Ok(())
    }
}

impl Drop for CpalCaptureStream {
    fn drop(&mut self) {
        if self.stream.is_some() {
            debug!("Releasing capture stream for {}", self.path.display());
        }
        if let Err(e) = self.release() {
            warn!("Failed to finalize WAV writer on drop: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::TempDir;

    fn writer(path: &Path) -> Result<hound::WavWriter<BufWriter<File>>> {
        Ok(hound::WavWriter::create(
            path,
            EncodingProfile::default().wav_spec(),
        )?)
    }

    #[test]
    fn test_sink_writes_after_callback_panic() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("audio_record_1.wav");
        let sink: SharedSink = Arc::new(Mutex::new(CaptureSink::new(None)));

        let held = Arc::clone(&sink);
        let _ = thread::spawn(move || {
            let _guard = held.lock();
            panic!("callback panicked while holding the sink");
        })
        .join();
        assert!(sink.is_poisoned());

        lock_sink(&sink).wav = Some(writer(&path)?);
        lock_sink(&sink).write(&[1, 2, 3])?;
        assert_eq!(lock_sink(&sink).finalize()?, 3);

        assert_eq!(hound::WavReader::open(&path)?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_sink_resamples_to_file_rate() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("audio_record_2.wav");
        let converter = RateConverter::new(48000, 16000, 1)?;
        let sink: SharedSink = Arc::new(Mutex::new(CaptureSink::new(Some(converter))));

        lock_sink(&sink).wav = Some(writer(&path)?);
        for _ in 0..10 {
            lock_sink(&sink).write(&[500i16; 480])?;
        }
        lock_sink(&sink).finalize()?;

        let reader = hound::WavReader::open(&path)?;
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.len(), 1600);
        Ok(())
    }

    #[test]
    fn test_sink_without_writer_drops_samples() -> Result<()> {
        let sink: SharedSink = Arc::new(Mutex::new(CaptureSink::new(None)));

        lock_sink(&sink).write(&[1, 2, 3])?;
        assert_eq!(lock_sink(&sink).finalize()?, 0);
        Ok(())
    }
}
