use serde::{Deserialize, Serialize};

use crate::detect::types::PoseSymbol;

/// Input configuration for a capture session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureConfig {
    /// Ordered sequence of poses to capture, fixed for the session's
    /// lifetime.
    pub required_poses: Vec<PoseSymbol>,
    /// Seconds a matched pose must be held before auto-capture. Zero is
    /// treated as one second.
    pub hold_seconds: u32,
    /// Delay between the countdown reaching zero and the snapshot, in
    /// milliseconds.
    pub capture_delay_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            required_poses: vec![PoseSymbol::One, PoseSymbol::Two],
            hold_seconds: 3,
            capture_delay_ms: 300,
        }
    }
}
