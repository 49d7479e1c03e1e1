pub mod backend;
pub mod capture;
pub mod convert;
pub mod file;
pub mod playback;

pub use backend::{
    AudioBackendFactory, CaptureDevice, CaptureStream, EncodingProfile, PlaybackDevice,
    PlaybackStream,
};
pub use capture::CpalCaptureDevice;
pub use file::AudioFile;
pub use playback::CpalPlaybackDevice;
