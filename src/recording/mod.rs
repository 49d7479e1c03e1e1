//! Recordings on disk: output path construction and directory listing

mod store;

pub use store::{Recording, RecordingStore, FILE_PREFIX};
