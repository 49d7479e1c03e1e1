//! Recording session management
//!
//! This module provides the `RecordingSession` controller that manages:
//! - Microphone capture into timestamped recordings
//! - Listing the recordings directory
//! - Playback of one recording at a time
//! - Session statistics and state snapshots

mod config;
mod session;
mod stats;

pub use config::SessionConfig;
pub use session::RecordingSession;
pub use stats::SessionStats;
