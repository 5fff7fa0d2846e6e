/// Capture sequencer states.
///
/// The advance after a capture is instantaneous — it happens inside
/// `CaptureSession::finish_capture`, so no separate state is observable
/// between `Capturing` and the next `WaitingForPose`/`Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    /// Stream not ready — entry into the sequence is blocked.
    Idle,
    /// Waiting for the expected pose to appear with a detected face.
    WaitingForPose,
    /// Pose matched; counting down the remaining hold seconds.
    Holding { remaining: u32 },
    /// Countdown hit zero; snapshot pending. Classification updates are
    /// locked out until the capture completes.
    Capturing,
    /// All required poses captured.
    Complete,
}

impl SequencerState {
    /// Snake-case state name for snapshots.
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::WaitingForPose => "waiting_for_pose",
            Self::Holding { .. } => "holding",
            Self::Capturing => "capturing",
            Self::Complete => "complete",
        }
    }

    /// Seconds remaining before auto-capture, if a hold is in progress.
    pub fn countdown(self) -> Option<u32> {
        match self {
            Self::Holding { remaining } => Some(remaining),
            Self::Capturing => Some(0),
            _ => None,
        }
    }
}
