use crate::detect::error::Result;
use crate::detect::types::{FaceDetection, Hand};
use crate::source::frame::Frame;

/// Face-presence detector.
///
/// Implementations wrap a real detection library; the pipeline only cares
/// about the detection list (empty list = no face). `initialize` runs once
/// before the first frame — model loading failures are fatal to the
/// session, per-frame failures are not.
pub trait FaceDetector: Send {
    /// One-time setup (model load, graph warm-up).
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Detect faces in a frame. An empty vec means no face present.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceDetection>>;
}

/// Hand landmark detector — one 21-point landmark set per detected hand.
pub trait HandDetector: Send {
    /// One-time setup (model load, graph warm-up).
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Detect hands in a frame. An empty vec means no hand present.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Hand>>;
}
