//! Pose-guided webcam capture.
//!
//! A camera stream is classified frame by frame (face presence + hand
//! pose from extended-finger count); a sequencer waits for each required
//! pose, confirms it with a hold countdown, and auto-captures a still per
//! pose until the sequence is exhausted. Captured images reach the host
//! application through a callback.
//!
//! The camera and the detectors are trait boundaries — real devices and
//! ML libraries plug in from outside, so everything here is testable
//! with scripted fakes.

pub mod detect;
pub mod diag;
pub mod flow;
pub mod sequencer;
pub mod source;

pub use detect::detector::{FaceDetector, HandDetector};
pub use detect::pipeline::DetectionPipeline;
pub use detect::types::{Landmark, Observation, PoseSymbol};
pub use flow::{CaptureCallback, CaptureFlow, FlowError, FlowTiming};
pub use sequencer::config::CaptureConfig;
pub use sequencer::session::{CaptureOutcome, CaptureSession, SessionSnapshot};
pub use sequencer::state::SequencerState;
pub use source::adapter::{FrameSource, StreamConstraints};
pub use source::encode::EncodedImage;
pub use source::error::SourceError;
pub use source::frame::Frame;
