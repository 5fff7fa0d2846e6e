use serde::{Deserialize, Serialize};

/// A detected feature point in normalized [0,1] image coordinates.
///
/// `y` grows downward, matching image conventions. Ephemeral — produced
/// per frame, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: Option<f32>,
}

impl Landmark {
    /// A 2D landmark with no depth estimate.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: None }
    }

    /// A 3D landmark.
    pub fn with_depth(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z: Some(z) }
    }
}

/// Discrete hand pose classification derived from extended-finger count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseSymbol {
    One,
    Two,
    None,
}

impl PoseSymbol {
    /// Human-readable display name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::One => "one finger",
            Self::Two => "two fingers",
            Self::None => "no pose",
        }
    }
}

/// Normalized bounding box of a detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A single face detection.
#[derive(Debug, Clone)]
pub struct FaceDetection {
    pub confidence: f32,
    pub bounds: BoundingBox,
}

/// One detected hand — 21 landmarks plus detector confidence.
#[derive(Debug, Clone)]
pub struct Hand {
    pub landmarks: Vec<Landmark>,
    pub confidence: f32,
}

/// Per-frame classification result fed to the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub face_detected: bool,
    pub pose: PoseSymbol,
}

impl Observation {
    /// No face, no pose — the "tracking lost" observation.
    pub fn absent() -> Self {
        Self {
            face_detected: false,
            pose: PoseSymbol::None,
        }
    }
}
