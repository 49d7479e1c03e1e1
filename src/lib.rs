pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod permissions;
pub mod recording;
pub mod session;

pub use audio::{
    AudioBackendFactory, AudioFile, CaptureDevice, CaptureStream, EncodingProfile,
    PlaybackDevice, PlaybackStream,
};
pub use config::Config;
pub use error::{RecorderError, RecorderResult};
pub use permissions::{ensure_permissions, HostPermissions, Permission, PermissionProvider};
pub use recording::{Recording, RecordingStore};
pub use session::{RecordingSession, SessionConfig, SessionStats};
