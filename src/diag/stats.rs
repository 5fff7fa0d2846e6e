use serde::Serialize;
use std::time::Instant;

/// Collects diagnostic counters for one capture flow.
pub struct FlowStats {
    frames_processed: u64,
    frames_dropped: u64,
    holds_started: u64,
    holds_cancelled: u64,
    auto_captures: u64,
    manual_captures: u64,
    start_time: Instant,
}

/// Snapshot of flow stats for serialisation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSnapshot {
    pub fps: f64,
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub holds_started: u64,
    pub holds_cancelled: u64,
    pub auto_captures: u64,
    pub manual_captures: u64,
}

impl FlowStats {
    /// Create new stats with zeroed counters.
    pub fn new() -> Self {
        Self {
            frames_processed: 0,
            frames_dropped: 0,
            holds_started: 0,
            holds_cancelled: 0,
            auto_captures: 0,
            manual_captures: 0,
            start_time: Instant::now(),
        }
    }

    /// Record a frame that went through the detection pipeline.
    pub fn record_frame(&mut self) {
        self.frames_processed += 1;
    }

    /// Record frames superseded by a newer one before processing.
    pub fn record_dropped(&mut self, count: u64) {
        self.frames_dropped += count;
    }

    /// Record a pose hold starting.
    pub fn record_hold_started(&mut self) {
        self.holds_started += 1;
    }

    /// Record a hold cancelled before its countdown finished.
    pub fn record_hold_cancelled(&mut self) {
        self.holds_cancelled += 1;
    }

    /// Record an automatic (sequence-driven) capture.
    pub fn record_auto_capture(&mut self) {
        self.auto_captures += 1;
    }

    /// Record a manual capture command.
    pub fn record_manual_capture(&mut self) {
        self.manual_captures += 1;
    }

    /// Processed frames per second since the flow started.
    pub fn fps(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed < 0.001 {
            return 0.0;
        }
        self.frames_processed as f64 / elapsed
    }

    /// Take a serialisable snapshot.
    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            fps: self.fps(),
            frames_processed: self.frames_processed,
            frames_dropped: self.frames_dropped,
            holds_started: self.holds_started,
            holds_cancelled: self.holds_cancelled,
            auto_captures: self.auto_captures,
            manual_captures: self.manual_captures,
        }
    }
}

impl Default for FlowStats {
    fn default() -> Self {
        Self::new()
    }
}
