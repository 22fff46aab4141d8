//! Save-slot progress and UI state persistence.
//!
//! Progress goes through [`ProgressBackend`] so the app does not care
//! whether a slot lives in a local JSON file or behind the tracker API.

#[cfg(feature = "network")]
pub mod api;
pub mod json_store;
pub mod queued;
pub mod schema;

use std::path::PathBuf;

use thiserror::Error;

use crate::store::schema::SlotProgress;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "network")]
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {status} for {url}")]
    Status { status: u16, url: String },
    #[error("background save worker stopped")]
    WorkerStopped,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

pub trait ProgressBackend {
    /// Short human label for the status line ("local", "remote").
    fn label(&self) -> &'static str;
    fn load_progress(&self, slot: u8) -> Result<SlotProgress, StoreError>;
    fn save_progress(&self, slot: u8, progress: &SlotProgress) -> Result<(), StoreError>;

    /// Failures of saves that completed after `save_progress` returned.
    /// Only backends that save in the background have any.
    fn take_failures(&self) -> Vec<StoreError> {
        Vec::new()
    }
}
