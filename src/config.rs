use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

use crate::audio::EncodingProfile;

/// Environment variables override file values, e.g. `LOQA_MEMOS__AUDIO__SAMPLE_RATE=8000`
pub const ENV_PREFIX: &str = "LOQA_MEMOS";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding recordings; `~` is expanded
    pub recordings_dir: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "loqa-memos".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            recordings_dir: "~/.cache/loqa-memos/recordings".to_string(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        let profile = EncodingProfile::default();
        Self {
            sample_rate: profile.sample_rate,
            channels: profile.channels,
        }
    }
}

impl Config {
    /// Load `path` (any extension `config` understands, optional) plus environment overrides
    pub fn load(path: &str) -> Result<Self> {
        Self::load_with_env_prefix(path, ENV_PREFIX)
    }

    pub fn load_with_env_prefix(path: &str, env_prefix: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            anyhow::bail!("audio.sample_rate must be greater than zero");
        }
        if !(1..=2).contains(&self.audio.channels) {
            anyhow::bail!(
                "audio.channels must be 1 or 2, got {}",
                self.audio.channels
            );
        }
        if self.storage.recordings_dir.trim().is_empty() {
            anyhow::bail!("storage.recordings_dir must not be empty");
        }
        Ok(())
    }

    pub fn recordings_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.storage.recordings_dir).into_owned())
    }

    pub fn encoding_profile(&self) -> EncodingProfile {
        EncodingProfile {
            sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
            ..EncodingProfile::default()
        }
    }
}
