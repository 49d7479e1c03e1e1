use std::path::PathBuf;

use crate::audio::EncodingProfile;
use crate::config::Config;

/// Configuration for a recording session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory recordings are written to and listed from
    pub recordings_dir: PathBuf,

    /// Encoding every recording is captured with
    pub profile: EncodingProfile,
}

impl SessionConfig {
    pub fn new(recordings_dir: impl Into<PathBuf>) -> Self {
        Self {
            recordings_dir: recordings_dir.into(),
            profile: EncodingProfile::default(),
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(config: &Config) -> Self {
        Self {
            recordings_dir: config.recordings_dir(),
            profile: config.encoding_profile(),
        }
    }
}
