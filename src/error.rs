use crate::plane::TrackableId;
use std::path::PathBuf;
use thiserror::Error;

/// Startup failures. None of these are recoverable; the runtime refuses to start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("layer {0} is not registered; add it to the layer registry before starting")]
    LayerNotRegistered(String),
    #[error("layer registry is full, cannot register {0}")]
    LayerRegistryFull(String),
    #[error("live session requested but no device session was provided")]
    MissingDevice,
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures reported by the device SDK, passed through untouched.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("trackable {0} is no longer valid")]
    InvalidTrackable(TrackableId),
    #[error("anchors on a live session need a trackable")]
    MissingTrackable,
    #[error("session is not tracking")]
    NotTracking,
    #[error("device failure: {0}")]
    Device(String),
}

#[derive(Debug, Error)]
pub enum ArError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{component} is not initialized; call initialize as soon as it is created")]
    NotInitialized { component: &'static str },
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

pub type ArResult<T> = Result<T, ArError>;

impl ArError {
    /// Config and usage errors stop the runtime. Backend errors only fail the frame.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ArError::Backend(_))
    }
}
