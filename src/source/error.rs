use thiserror::Error;

/// Frame source errors.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("frame encoding failed: {0}")]
    Encode(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, SourceError>;
