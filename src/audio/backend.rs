use anyhow::Result;
use std::path::Path;

/// The one encoding recordings are written in: 16-bit PCM in a WAV container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingProfile {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels written to the file (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Bits per sample (always 16)
    pub bits_per_sample: u16,
    /// File extension, without the dot
    pub extension: &'static str,
}

impl Default for EncodingProfile {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // Plenty for voice memos
            channels: 1,        // Mono
            bits_per_sample: 16,
            extension: "wav",
        }
    }
}

impl EncodingProfile {
    pub fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: hound::SampleFormat::Int,
        }
    }
}

/// Host audio-capture service
///
/// `open` acquires and configures a capture resource bound to `output`.
/// Nothing is recorded until the returned stream is started.
pub trait CaptureDevice {
    fn open(&self, output: &Path, profile: &EncodingProfile) -> Result<Box<dyn CaptureStream>>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// An acquired capture resource. Dropping it releases the device.
pub trait CaptureStream {
    /// Begin writing captured audio to the output file
    fn start(&mut self) -> Result<()>;

    /// Stop capturing, flush the output to a complete file and release the device
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Host audio-playback service
///
/// `open` acquires a playback resource bound to `path` and prepares it.
pub trait PlaybackDevice {
    fn open(&self, path: &Path) -> Result<Box<dyn PlaybackStream>>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// An acquired playback resource. Dropping it releases the device.
pub trait PlaybackStream {
    fn start(&mut self) -> Result<()>;

    /// True once every sample has been handed to the device
    fn is_finished(&self) -> bool;
}

/// Audio backend factory
pub struct AudioBackendFactory;

impl AudioBackendFactory {
    /// Microphone capture on the default host
    pub fn capture() -> Box<dyn CaptureDevice> {
        Box::new(super::capture::CpalCaptureDevice::new())
    }

    /// Speaker output on the default host
    pub fn playback() -> Box<dyn PlaybackDevice> {
        Box::new(super::playback::CpalPlaybackDevice::new())
    }
}
