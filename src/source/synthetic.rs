use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::source::adapter::{FrameSource, StreamConstraints};
use crate::source::error::{Result, SourceError};
use crate::source::frame::{Frame, FrameCell};

/// An in-memory frame source for testing without real hardware.
///
/// Produces gradient test frames on demand via `deliver_frame` — tests
/// control exactly when frames arrive instead of depending on a device
/// clock. Can be constructed "unavailable" to exercise the
/// `DeviceUnavailable` path.
pub struct SyntheticSource {
    available: bool,
    started: AtomicBool,
    constraints: Mutex<StreamConstraints>,
    cell: FrameCell,
}

impl SyntheticSource {
    /// Create a source that grants camera access.
    pub fn new() -> Self {
        Self {
            available: true,
            started: AtomicBool::new(false),
            constraints: Mutex::new(StreamConstraints::default()),
            cell: FrameCell::new(),
        }
    }

    /// Create a source that refuses camera access.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Push the next test frame into the stream.
    ///
    /// No-op while the stream is not started, mirroring a device that
    /// only produces frames while streaming.
    pub fn deliver_frame(&self) {
        if !self.started.load(Ordering::Relaxed) {
            return;
        }
        let (width, height) = {
            let c = self.constraints.lock();
            (c.width, c.height)
        };
        let seq = self.cell.sequence();
        self.cell.push(test_pattern_frame(width, height, seq));
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for SyntheticSource {
    fn start_stream(&self, constraints: &StreamConstraints) -> Result<()> {
        if !self.available {
            return Err(SourceError::DeviceUnavailable(
                "no camera device granted".to_string(),
            ));
        }
        *self.constraints.lock() = constraints.clone();
        self.started.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn latest_frame(&self) -> Option<Arc<Frame>> {
        if !self.started.load(Ordering::Relaxed) {
            return None;
        }
        self.cell.latest()
    }

    fn sequence(&self) -> u64 {
        self.cell.sequence()
    }

    fn stop_stream(&self) {
        self.started.store(false, Ordering::Relaxed);
    }
}

/// Gradient test pattern, phase-shifted by sequence number so successive
/// frames differ.
fn test_pattern_frame(width: u32, height: u32, seq: u64) -> Frame {
    let shift = (seq % 256) as u32;
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push(((x + shift) % 256) as u8); // R
            data.push((y % 256) as u8); // G
            data.push(128); // B
        }
    }
    Frame {
        data,
        width,
        height,
        timestamp_us: seq * 33_333,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::encode::snapshot;

    #[test]
    fn unavailable_source_refuses_to_start() {
        let source = SyntheticSource::unavailable();
        let result = source.start_stream(&StreamConstraints::default());
        assert!(matches!(result, Err(SourceError::DeviceUnavailable(_))));
    }

    #[test]
    fn latest_frame_is_none_before_start() {
        let source = SyntheticSource::new();
        assert!(source.latest_frame().is_none());
    }

    #[test]
    fn deliver_frame_is_noop_before_start() {
        let source = SyntheticSource::new();
        source.deliver_frame();
        assert_eq!(source.sequence(), 0);
    }

    #[test]
    fn delivered_frames_match_constraints() {
        let source = SyntheticSource::new();
        source
            .start_stream(&StreamConstraints {
                width: 32,
                height: 24,
                ..StreamConstraints::default()
            })
            .unwrap();
        source.deliver_frame();

        let frame = source.latest_frame().unwrap();
        assert_eq!(frame.width, 32);
        assert_eq!(frame.height, 24);
        assert_eq!(frame.data.len(), 32 * 24 * 3);
    }

    #[test]
    fn successive_frames_differ() {
        let source = SyntheticSource::new();
        source.start_stream(&StreamConstraints::default()).unwrap();
        source.deliver_frame();
        let first = source.latest_frame().unwrap();
        source.deliver_frame();
        let second = source.latest_frame().unwrap();
        assert_ne!(first.data[0], second.data[0]);
        assert_eq!(source.sequence(), 2);
    }

    #[test]
    fn snapshot_returns_none_before_first_frame() {
        let source = SyntheticSource::new();
        source.start_stream(&StreamConstraints::default()).unwrap();
        assert!(snapshot(&source, 85).is_none());
    }

    #[test]
    fn snapshot_returns_jpeg_after_first_frame() {
        let source = SyntheticSource::new();
        source.start_stream(&StreamConstraints::default()).unwrap();
        source.deliver_frame();

        let image = snapshot(&source, 85).unwrap();
        assert_eq!(image.bytes()[0], 0xFF);
        assert_eq!(image.bytes()[1], 0xD8);
    }

    #[test]
    fn stop_stream_is_idempotent() {
        let source = SyntheticSource::new();
        source.start_stream(&StreamConstraints::default()).unwrap();
        source.stop_stream();
        source.stop_stream(); // Should not panic
        assert!(source.latest_frame().is_none());
    }

    #[test]
    fn synthetic_source_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyntheticSource>();
    }
}
