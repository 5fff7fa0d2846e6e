use thiserror::Error;

use crate::detect::error::DetectorError;
use crate::source::error::SourceError;

/// Capture flow errors.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Detector(#[from] DetectorError),

    #[error("snapshot unavailable: stream not ready")]
    SnapshotUnavailable,
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, FlowError>;
