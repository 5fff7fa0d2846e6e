use thiserror::Error;

/// Detector subsystem errors.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("detector initialisation failed: {0}")]
    Init(String),

    #[error("detection pass failed: {0}")]
    Detection(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, DetectorError>;
