//! Startup permission gate
//!
//! Recording needs a microphone and a writable recordings directory. Both
//! are checked once before any command runs; a denial is fatal.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::audio::CpalCaptureDevice;
use crate::error::{RecorderError, RecorderResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Capture from an input device
    Microphone,
    /// Write recordings to disk
    Storage,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Microphone => write!(f, "microphone"),
            Permission::Storage => write!(f, "storage"),
        }
    }
}

pub trait PermissionProvider {
    /// Whether `permission` is currently granted
    fn check(&self, permission: Permission) -> bool;

    /// Ask for `permission`; returns whether it is granted afterwards
    fn request(&self, permission: Permission) -> bool;
}

/// Permissions as the desktop host sees them
///
/// There is no prompt to show on a desktop host, so a request re-checks
/// after creating the recordings directory.
pub struct HostPermissions {
    recordings_dir: PathBuf,
}

impl HostPermissions {
    pub fn new(recordings_dir: impl Into<PathBuf>) -> Self {
        Self {
            recordings_dir: recordings_dir.into(),
        }
    }

    fn storage_writable(&self) -> bool {
        let probe = self.recordings_dir.join(".loqa-memos-probe");
        match fs::write(&probe, b"") {
            Ok(()) => {
                let _ = fs::remove_file(&probe);
                true
            }
            Err(_) => false,
        }
    }
}

impl PermissionProvider for HostPermissions {
    fn check(&self, permission: Permission) -> bool {
        match permission {
            Permission::Microphone => CpalCaptureDevice::new().is_available(),
            Permission::Storage => self.recordings_dir.is_dir() && self.storage_writable(),
        }
    }

    fn request(&self, permission: Permission) -> bool {
        if permission == Permission::Storage {
            if let Err(e) = fs::create_dir_all(&self.recordings_dir) {
                warn!(
                    "Cannot create recordings directory {}: {}",
                    self.recordings_dir.display(),
                    e
                );
                return false;
            }
        }
        self.check(permission)
    }
}

/// Request every missing permission; fails on the first one still denied
pub fn ensure_permissions(
    provider: &dyn PermissionProvider,
    permissions: &[Permission],
) -> RecorderResult<()> {
    let missing: Vec<Permission> = permissions
        .iter()
        .copied()
        .filter(|p| !provider.check(*p))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    info!("Requesting permissions: {:?}", missing);

    for permission in missing {
        if !provider.request(permission) {
            warn!("Permission denied: {}", permission);
            return Err(RecorderError::PermissionDenied(permission));
        }
    }

    Ok(())
}
