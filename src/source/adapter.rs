use std::sync::Arc;

use crate::source::error::Result;
use crate::source::frame::Frame;

/// Camera facing preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    /// Front-facing (selfie) camera.
    #[default]
    User,
    /// Rear-facing camera.
    Environment,
}

/// Resolution and facing preferences passed to `start_stream`.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConstraints {
    pub width: u32,
    pub height: u32,
    pub fps: f32,
    pub facing: Facing,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30.0,
            facing: Facing::User,
        }
    }
}

/// Abstraction over a camera device producing live frames.
///
/// Implementations deliver frames at the device's native rate into an
/// internal latest-frame slot; consumers poll `latest_frame` and use
/// `sequence` to detect new arrivals. No queueing — only the most recent
/// frame matters.
pub trait FrameSource: Send + Sync {
    /// Request camera access with the given preferences.
    ///
    /// Fails with `SourceError::DeviceUnavailable` when no camera is
    /// granted or present. Non-fatal: callers render a visible
    /// "camera unavailable" state instead of crashing.
    fn start_stream(&self, constraints: &StreamConstraints) -> Result<()>;

    /// The most recent frame, or `None` while the stream is not ready.
    fn latest_frame(&self) -> Option<Arc<Frame>>;

    /// Number of frames delivered so far.
    fn sequence(&self) -> u64;

    /// Release the camera. Idempotent.
    fn stop_stream(&self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::error::SourceError;

    /// Mock source for testing the trait contract.
    struct MockSource {
        available: bool,
    }

    impl FrameSource for MockSource {
        fn start_stream(&self, _constraints: &StreamConstraints) -> Result<()> {
            if self.available {
                Ok(())
            } else {
                Err(SourceError::DeviceUnavailable("mock".to_string()))
            }
        }

        fn latest_frame(&self) -> Option<Arc<Frame>> {
            None
        }

        fn sequence(&self) -> u64 {
            0
        }

        fn stop_stream(&self) {}
    }

    #[test]
    fn mock_source_start_succeeds_when_available() {
        let source = MockSource { available: true };
        assert!(source.start_stream(&StreamConstraints::default()).is_ok());
    }

    #[test]
    fn mock_source_start_reports_device_unavailable() {
        let source = MockSource { available: false };
        let result = source.start_stream(&StreamConstraints::default());
        assert!(matches!(result, Err(SourceError::DeviceUnavailable(_))));
    }

    #[test]
    fn default_constraints_are_vga_user_facing() {
        let constraints = StreamConstraints::default();
        assert_eq!(constraints.width, 640);
        assert_eq!(constraints.height, 480);
        assert_eq!(constraints.facing, Facing::User);
    }

    #[test]
    fn trait_object_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn FrameSource>>();
    }
}
