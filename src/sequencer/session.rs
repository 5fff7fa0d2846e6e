use serde::Serialize;

use crate::detect::types::{Observation, PoseSymbol};
use crate::sequencer::config::CaptureConfig;
use crate::sequencer::state::SequencerState;

/// The pose-sequence state machine.
///
/// Pure and deterministic: frame classifications arrive via
/// `on_observation`, countdown seconds via `tick`, and the
/// snapshot-taken signal via `finish_capture`. The session owns no
/// timers and does no IO, so it is testable with scripted inputs —
/// real-time driving lives in `flow`.
///
/// There is no hard failure mode: lost face, lost hand, or a changed
/// pose always fold back into `WaitingForPose`, never an error.
pub struct CaptureSession {
    config: CaptureConfig,
    state: SequencerState,
    pose_index: usize,
    face_detected: bool,
    current_pose: PoseSymbol,
}

/// Result of a completed capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOutcome {
    /// Index of the pose that was just captured.
    pub pose_index: usize,
    /// Whether the sequence is now exhausted.
    pub session_complete: bool,
}

/// Serializable projection of the session for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: &'static str,
    pub pose_index: usize,
    pub total_poses: usize,
    pub expected_pose: Option<PoseSymbol>,
    pub current_pose: PoseSymbol,
    pub face_detected: bool,
    pub countdown: Option<u32>,
    pub is_capturing: bool,
    pub status: String,
}

impl CaptureSession {
    /// Start a session at the first pose.
    ///
    /// An empty required-pose sequence is complete from the start.
    pub fn new(config: CaptureConfig) -> Self {
        let state = if config.required_poses.is_empty() {
            SequencerState::Complete
        } else {
            SequencerState::WaitingForPose
        };
        Self {
            config,
            state,
            pose_index: 0,
            face_detected: false,
            current_pose: PoseSymbol::None,
        }
    }

    /// Create a session blocked in `Idle` — used while the camera stream
    /// is unavailable. The session stays `Idle` until the flow is
    /// reopened with a working stream.
    pub fn idle(config: CaptureConfig) -> Self {
        Self {
            state: SequencerState::Idle,
            ..Self::new(config)
        }
    }

    /// Apply one frame's classification.
    ///
    /// While a capture is in flight the observed fields still refresh,
    /// but no transition fires — re-entering a hold during the
    /// capture window would risk a second capture for the same pose.
    pub fn on_observation(&mut self, obs: Observation) {
        self.face_detected = obs.face_detected;
        // Face loss invalidates the pose for the frame as well
        self.current_pose = if obs.face_detected {
            obs.pose
        } else {
            PoseSymbol::None
        };

        match self.state {
            SequencerState::WaitingForPose => {
                if self.face_detected && Some(self.current_pose) == self.expected_pose() {
                    // A zero hold still confirms for one full tick
                    self.state = SequencerState::Holding {
                        remaining: self.config.hold_seconds.max(1),
                    };
                    tracing::debug!(
                        "pose {:?} matched, holding for {}s",
                        self.current_pose,
                        self.config.hold_seconds.max(1)
                    );
                }
            }
            SequencerState::Holding { .. } => {
                if !self.face_detected || Some(self.current_pose) != self.expected_pose() {
                    // Cancel the hold; countdown becomes null
                    self.state = SequencerState::WaitingForPose;
                    tracing::debug!("hold cancelled, back to waiting");
                }
            }
            SequencerState::Idle | SequencerState::Capturing | SequencerState::Complete => {}
        }
    }

    /// Advance the hold countdown by one second.
    ///
    /// Returns `true` exactly when the countdown reaches zero and the
    /// session enters `Capturing` — the caller then schedules the
    /// capture delay and eventually calls `finish_capture`.
    pub fn tick(&mut self) -> bool {
        match self.state {
            SequencerState::Holding { remaining } if remaining > 1 => {
                self.state = SequencerState::Holding {
                    remaining: remaining - 1,
                };
                false
            }
            SequencerState::Holding { .. } => {
                self.state = SequencerState::Capturing;
                true
            }
            _ => false,
        }
    }

    /// Record that the pending snapshot was taken and advance the cursor.
    ///
    /// A no-op outside `Capturing` (a restart may have intervened while
    /// the capture delay was pending).
    pub fn finish_capture(&mut self) -> CaptureOutcome {
        if self.state != SequencerState::Capturing {
            return CaptureOutcome {
                pose_index: self.pose_index,
                session_complete: self.is_complete(),
            };
        }

        let captured = self.pose_index;
        self.pose_index += 1;
        // Current pose is unknown until the next frame
        self.current_pose = PoseSymbol::None;
        self.state = if self.pose_index < self.config.required_poses.len() {
            SequencerState::WaitingForPose
        } else {
            SequencerState::Complete
        };

        CaptureOutcome {
            pose_index: captured,
            session_complete: self.state == SequencerState::Complete,
        }
    }

    /// Restart the sequence from the first pose, cancelling any hold or
    /// pending capture. A no-op while `Idle` — without a stream there is
    /// no sequence to enter.
    pub fn restart(&mut self) {
        if self.state == SequencerState::Idle {
            return;
        }
        self.pose_index = 0;
        self.current_pose = PoseSymbol::None;
        self.state = if self.config.required_poses.is_empty() {
            SequencerState::Complete
        } else {
            SequencerState::WaitingForPose
        };
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn pose_index(&self) -> usize {
        self.pose_index
    }

    pub fn face_detected(&self) -> bool {
        self.face_detected
    }

    pub fn current_pose(&self) -> PoseSymbol {
        self.current_pose
    }

    /// The pose the sequencer is waiting for, if any remain.
    pub fn expected_pose(&self) -> Option<PoseSymbol> {
        self.config.required_poses.get(self.pose_index).copied()
    }

    pub fn countdown(&self) -> Option<u32> {
        self.state.countdown()
    }

    pub fn is_capturing(&self) -> bool {
        self.state == SequencerState::Capturing
    }

    pub fn is_complete(&self) -> bool {
        self.state == SequencerState::Complete
    }

    /// Human-readable status — derived from the current state, never
    /// stored, so display and control state cannot drift apart.
    pub fn status_message(&self) -> String {
        match self.state {
            SequencerState::Idle => "Camera unavailable".to_string(),
            SequencerState::Complete => "All poses captured".to_string(),
            SequencerState::Capturing => "Capturing...".to_string(),
            SequencerState::Holding { remaining } => {
                format!("Hold pose: capturing in {remaining}s")
            }
            SequencerState::WaitingForPose => {
                if !self.face_detected {
                    return "Face not detected".to_string();
                }
                let expected = self
                    .expected_pose()
                    .map(PoseSymbol::display_name)
                    .unwrap_or("-");
                match self.current_pose {
                    PoseSymbol::None => format!("Show {expected} to the camera"),
                    pose => format!(
                        "Detected {}, expected {expected}",
                        pose.display_name()
                    ),
                }
            }
        }
    }

    /// Serializable projection for display.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.name(),
            pose_index: self.pose_index,
            total_poses: self.config.required_poses.len(),
            expected_pose: self.expected_pose(),
            current_pose: self.current_pose,
            face_detected: self.face_detected,
            countdown: self.countdown(),
            is_capturing: self.is_capturing(),
            status: self.status_message(),
        }
    }
}
