use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A single video frame delivered by a frame source.
pub struct Frame {
    /// Raw pixel data (RGB24).
    pub data: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Capture timestamp in microseconds.
    pub timestamp_us: u64,
}

/// Thread-safe slot holding the most recent frame.
///
/// Only the latest frame matters for classification, so a push simply
/// replaces whatever was there before — frames that were never read are
/// dropped, not queued. Frames are wrapped in `Arc` so consumers get a
/// cheap reference-counted pointer instead of cloning pixel buffers.
pub struct FrameCell {
    latest: Mutex<Option<Arc<Frame>>>,
    /// Monotonic counter incremented on each push — lets consumers detect
    /// new frames even when device timestamps are unreliable.
    sequence: AtomicU64,
}

impl FrameCell {
    /// Create an empty cell.
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(None),
            sequence: AtomicU64::new(0),
        }
    }

    /// Replace the stored frame with a newer one.
    pub fn push(&self, frame: Frame) {
        *self.latest.lock() = Some(Arc::new(frame));
        self.sequence.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of frames pushed so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// The most recently pushed frame, if any.
    pub fn latest(&self) -> Option<Arc<Frame>> {
        self.latest.lock().clone()
    }
}

impl Default for FrameCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frame(value: u8, timestamp: u64) -> Frame {
        Frame {
            data: vec![value; 300],
            width: 10,
            height: 10,
            timestamp_us: timestamp,
        }
    }

    #[test]
    fn frame_cell_returns_none_when_empty() {
        let cell = FrameCell::new();
        assert!(cell.latest().is_none());
        assert_eq!(cell.sequence(), 0);
    }

    #[test]
    fn frame_cell_stores_and_retrieves_latest() {
        let cell = FrameCell::new();
        cell.push(make_frame(1, 100));
        cell.push(make_frame(2, 200));

        let latest = cell.latest().unwrap();
        assert_eq!(latest.data[0], 2);
        assert_eq!(latest.timestamp_us, 200);
    }

    #[test]
    fn frame_cell_sequence_counts_pushes() {
        let cell = FrameCell::new();
        cell.push(make_frame(1, 100));
        cell.push(make_frame(2, 200));
        cell.push(make_frame(3, 300));
        assert_eq!(cell.sequence(), 3);
    }

    #[test]
    fn frame_cell_latest_returns_arc_not_clone() {
        let cell = FrameCell::new();
        cell.push(make_frame(42, 100));

        let a = cell.latest().unwrap();
        let b = cell.latest().unwrap();

        // Both should point to the same allocation — no deep copy
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.data[0], 42);
    }

    #[test]
    fn frame_cell_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FrameCell>();
    }
}
