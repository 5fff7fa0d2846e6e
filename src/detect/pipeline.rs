use crate::detect::detector::{FaceDetector, HandDetector};
use crate::detect::error::Result;
use crate::detect::fingers;
use crate::detect::types::{Hand, Observation, PoseSymbol};
use crate::source::frame::Frame;

/// Converts raw frames into per-frame classified signals.
///
/// Runs the face detector first: a frame with no face yields the absent
/// observation and the hand detector is not consulted (loss of face
/// tracking invalidates any in-progress pose hold). Detector instances
/// are injected so the pipeline is testable without a real camera or ML
/// library.
///
/// Per-frame detector failures are folded into the None classification —
/// transient misses self-correct on the next frame, never escalate.
pub struct DetectionPipeline {
    face: Box<dyn FaceDetector>,
    hand: Box<dyn HandDetector>,
    last_hands: Vec<Hand>,
}

impl DetectionPipeline {
    /// Wire the pipeline from injected detector instances.
    pub fn new(face: Box<dyn FaceDetector>, hand: Box<dyn HandDetector>) -> Self {
        Self {
            face,
            hand,
            last_hands: Vec::new(),
        }
    }

    /// One-time detector setup. Failure here is fatal to the session.
    pub fn initialize(&mut self) -> Result<()> {
        self.face.initialize()?;
        self.hand.initialize()?;
        Ok(())
    }

    /// Classify a single frame.
    pub fn process(&mut self, frame: &Frame) -> Observation {
        let faces = match self.face.detect(frame) {
            Ok(faces) => faces,
            Err(e) => {
                tracing::warn!("face detection failed, treating as no face: {e}");
                Vec::new()
            }
        };

        if faces.is_empty() {
            self.last_hands.clear();
            return Observation::absent();
        }

        self.last_hands = match self.hand.detect(frame) {
            Ok(hands) => hands,
            Err(e) => {
                tracing::warn!("hand detection failed, treating as no hand: {e}");
                Vec::new()
            }
        };

        let pose = best_hand(&self.last_hands)
            .map(|hand| fingers::classify(fingers::count_extended(&hand.landmarks)))
            .unwrap_or(PoseSymbol::None);

        Observation {
            face_detected: true,
            pose,
        }
    }

    /// Hands from the most recent `process` call, for overlay rendering.
    pub fn last_hands(&self) -> &[Hand] {
        &self.last_hands
    }
}

/// Pick the hand whose classification wins for the frame.
///
/// The highest-confidence hand; ties keep the earlier detector-order
/// entry. Deterministic, unlike last-write-wins over detector iteration
/// order.
fn best_hand(hands: &[Hand]) -> Option<&Hand> {
    hands
        .iter()
        .reduce(|best, hand| if hand.confidence > best.confidence { hand } else { best })
}
