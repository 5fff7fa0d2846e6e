use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::detect::overlay;
use crate::detect::pipeline::DetectionPipeline;
use crate::diag::stats::{FlowSnapshot, FlowStats};
use crate::flow::error::{FlowError, Result};
use crate::sequencer::config::CaptureConfig;
use crate::sequencer::session::{CaptureSession, SessionSnapshot};
use crate::sequencer::state::SequencerState;
use crate::source::adapter::{FrameSource, StreamConstraints};
use crate::source::encode::{snapshot, EncodedImage};
use crate::source::frame::{Frame, FrameCell};

/// Callback invoked with each captured still image.
pub type CaptureCallback = Arc<dyn Fn(EncodedImage) + Send + Sync>;

const JPEG_QUALITY: u8 = 85;

/// Timer configuration for the flow driver.
///
/// Defaults are the production values (1-second hold ticks, 300 ms
/// capture delay); tests inject millisecond intervals to keep runs fast.
#[derive(Debug, Clone)]
pub struct FlowTiming {
    /// Interval between hold countdown decrements.
    pub tick_interval: Duration,
    /// Delay between the countdown reaching zero and the snapshot.
    pub capture_delay: Duration,
    /// Poll interval for the driver thread.
    pub poll_interval: Duration,
}

impl Default for FlowTiming {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            capture_delay: Duration::from_millis(300),
            poll_interval: Duration::from_millis(15),
        }
    }
}

impl FlowTiming {
    /// Timing derived from a session config (capture delay only; the
    /// hold tick is a real-time second).
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self {
            capture_delay: Duration::from_millis(config.capture_delay_ms),
            ..Self::default()
        }
    }
}

/// Everything the driver thread owns.
struct DriverContext {
    source: Arc<dyn FrameSource>,
    pipeline: DetectionPipeline,
    session: Arc<Mutex<CaptureSession>>,
    stats: Arc<Mutex<FlowStats>>,
    overlay: Arc<FrameCell>,
    on_capture: CaptureCallback,
    shutdown: Arc<AtomicBool>,
    timing: FlowTiming,
}

/// An active pose-guided capture flow.
///
/// Owns the camera stream, the detection pipeline and the sequencer
/// session exclusively; a single driver thread processes frames serially
/// (one in-flight detection pass, a frame's updates fully applied before
/// the next frame) and runs the hold/capture timers. Stopping the flow
/// joins the thread, so no timer fires after teardown.
pub struct CaptureFlow {
    source: Arc<dyn FrameSource>,
    session: Arc<Mutex<CaptureSession>>,
    stats: Arc<Mutex<FlowStats>>,
    overlay: Arc<FrameCell>,
    on_capture: CaptureCallback,
    shutdown: Arc<AtomicBool>,
    driver: Option<JoinHandle<()>>,
}

impl CaptureFlow {
    /// Start the flow: initialize detectors, open the stream, spawn the
    /// driver thread.
    ///
    /// `SourceError::DeviceUnavailable` is non-fatal to the application —
    /// callers render a visible unavailable state (see [`CaptureFlow::idle`])
    /// and recover only through an explicit reopen.
    pub fn start(
        source: Arc<dyn FrameSource>,
        pipeline: DetectionPipeline,
        config: CaptureConfig,
        constraints: &StreamConstraints,
        on_capture: CaptureCallback,
    ) -> Result<Self> {
        let timing = FlowTiming::from_config(&config);
        Self::start_with_timing(source, pipeline, config, constraints, on_capture, timing)
    }

    /// Start with explicit timer intervals (for tests).
    pub fn start_with_timing(
        source: Arc<dyn FrameSource>,
        mut pipeline: DetectionPipeline,
        config: CaptureConfig,
        constraints: &StreamConstraints,
        on_capture: CaptureCallback,
        timing: FlowTiming,
    ) -> Result<Self> {
        // Detector load failure is fatal to this session
        pipeline.initialize()?;
        source.start_stream(constraints)?;
        info!(
            "capture flow starting: {} pose(s), {}s hold",
            config.required_poses.len(),
            config.hold_seconds
        );

        let session = Arc::new(Mutex::new(CaptureSession::new(config)));
        let stats = Arc::new(Mutex::new(FlowStats::new()));
        let overlay = Arc::new(FrameCell::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let ctx = DriverContext {
            source: Arc::clone(&source),
            pipeline,
            session: Arc::clone(&session),
            stats: Arc::clone(&stats),
            overlay: Arc::clone(&overlay),
            on_capture: Arc::clone(&on_capture),
            shutdown: Arc::clone(&shutdown),
            timing,
        };

        let driver = std::thread::Builder::new()
            .name("pose-capture-driver".to_string())
            .spawn(move || run_driver(ctx))
            .expect("failed to spawn driver thread");

        Ok(Self {
            source,
            session,
            stats,
            overlay,
            on_capture,
            shutdown,
            driver: Some(driver),
        })
    }

    /// A flow blocked on an unavailable camera.
    ///
    /// No thread, no timers; the session stays `Idle` with a visible
    /// status until the user reopens the flow.
    pub fn idle(
        source: Arc<dyn FrameSource>,
        config: CaptureConfig,
        on_capture: CaptureCallback,
    ) -> Self {
        Self {
            source,
            session: Arc::new(Mutex::new(CaptureSession::idle(config))),
            stats: Arc::new(Mutex::new(FlowStats::new())),
            overlay: Arc::new(FrameCell::new()),
            on_capture,
            shutdown: Arc::new(AtomicBool::new(true)),
            driver: None,
        }
    }

    /// Capture a still right now, independent of sequence progress.
    ///
    /// The session state is untouched — legal in any state, including
    /// `Complete`.
    pub fn manual_capture(&self) -> Result<()> {
        let image =
            snapshot(self.source.as_ref(), JPEG_QUALITY).ok_or(FlowError::SnapshotUnavailable)?;
        (self.on_capture)(image);
        self.stats.lock().record_manual_capture();
        Ok(())
    }

    /// Restart the pose sequence from the beginning. A no-op on an idle
    /// flow — reopening the stream is the only way out of `Idle`.
    pub fn restart(&self) {
        self.session.lock().restart();
        info!("capture sequence restarted");
    }

    /// Whether the driver is running.
    pub fn is_running(&self) -> bool {
        self.driver.is_some() && !self.shutdown.load(Ordering::Relaxed)
    }

    /// Current session projection for display.
    pub fn session_snapshot(&self) -> SessionSnapshot {
        self.session.lock().snapshot()
    }

    /// Current status line.
    pub fn status(&self) -> String {
        self.session.lock().status_message()
    }

    /// Diagnostic counters for this flow.
    pub fn diagnostics(&self) -> FlowSnapshot {
        self.stats.lock().snapshot()
    }

    /// The latest frame with hand skeleton overlay, JPEG-encoded.
    ///
    /// Presentational only; `None` until the first frame is processed.
    pub fn preview_frame(&self) -> Option<EncodedImage> {
        let frame = self.overlay.latest()?;
        match crate::source::encode::encode_jpeg(&frame, JPEG_QUALITY) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("preview encoding failed: {e}");
                None
            }
        }
    }

    /// Stop the flow: join the driver thread and release the camera.
    /// Idempotent — no timer can fire after this returns.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.driver.take() {
            let _ = handle.join();
        }
        self.source.stop_stream();
    }
}

impl Drop for CaptureFlow {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Driver loop: frames, hold ticks and the capture delay, all serial.
fn run_driver(mut ctx: DriverContext) {
    let mut last_seq = ctx.source.sequence();
    let mut next_tick: Option<Instant> = None;
    let mut capture_at: Option<Instant> = None;

    loop {
        if ctx.shutdown.load(Ordering::Relaxed) {
            info!("capture flow driver exiting");
            return;
        }

        // Frame step — only the newest frame matters; everything between
        // polls was superseded and counts as dropped.
        let seq = ctx.source.sequence();
        if seq != last_seq {
            if seq > last_seq + 1 {
                ctx.stats.lock().record_dropped(seq - last_seq - 1);
            }
            last_seq = seq;
            if let Some(frame) = ctx.source.latest_frame() {
                let obs = ctx.pipeline.process(&frame);
                ctx.stats.lock().record_frame();
                push_overlay(&ctx.overlay, &ctx.pipeline, &frame);

                let (was_holding, now_holding) = {
                    let mut session = ctx.session.lock();
                    let before = matches!(session.state(), SequencerState::Holding { .. });
                    session.on_observation(obs);
                    let after = matches!(session.state(), SequencerState::Holding { .. });
                    (before, after)
                };
                match (was_holding, now_holding) {
                    (false, true) => {
                        next_tick = Some(Instant::now() + ctx.timing.tick_interval);
                        ctx.stats.lock().record_hold_started();
                    }
                    (true, false) => {
                        next_tick = None;
                        ctx.stats.lock().record_hold_cancelled();
                    }
                    _ => {}
                }
            }
        }

        // Countdown step
        if next_tick.is_some_and(|due| Instant::now() >= due) {
            let due = next_tick.take().unwrap_or_else(Instant::now);
            let mut session = ctx.session.lock();
            if session.tick() {
                capture_at = Some(Instant::now() + ctx.timing.capture_delay);
            } else if matches!(session.state(), SequencerState::Holding { .. }) {
                next_tick = Some(due + ctx.timing.tick_interval);
            }
        }

        // Capture step — guarded so a restart during the delay window
        // cancels the capture instead of firing against a reset session
        if capture_at.is_some_and(|due| Instant::now() >= due) {
            capture_at = None;
            if ctx.session.lock().is_capturing() {
                match snapshot(ctx.source.as_ref(), JPEG_QUALITY) {
                    Some(image) => {
                        (ctx.on_capture)(image);
                        ctx.stats.lock().record_auto_capture();
                    }
                    None => warn!("stream produced no frame at capture time"),
                }
                let outcome = ctx.session.lock().finish_capture();
                if outcome.session_complete {
                    info!("all poses captured");
                } else {
                    info!("captured pose {}", outcome.pose_index + 1);
                }
            }
        }

        std::thread::sleep(ctx.timing.poll_interval);
    }
}

/// Best-effort overlay of the detected hand skeletons onto a copy of the
/// frame.
fn push_overlay(cell: &FrameCell, pipeline: &DetectionPipeline, frame: &Frame) {
    let mut data = frame.data.clone();
    overlay::render_hands(&mut data, frame.width, frame.height, pipeline.last_hands());
    cell.push(Frame {
        data,
        width: frame.width,
        height: frame.height,
        timestamp_us: frame.timestamp_us,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detector::{FaceDetector, HandDetector};
    use crate::detect::error::DetectorError;
    use crate::detect::fingers::make_hand_landmarks;
    use crate::detect::types::{BoundingBox, FaceDetection, Hand, PoseSymbol};
    use crate::source::error::SourceError;
    use crate::source::synthetic::SyntheticSource;
    use std::sync::atomic::AtomicUsize;

    /// Face detector driven by a shared flag the test flips.
    struct SharedFace {
        present: Arc<AtomicBool>,
    }

    impl FaceDetector for SharedFace {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> crate::detect::error::Result<Vec<FaceDetection>> {
            if self.present.load(Ordering::Relaxed) {
                Ok(vec![FaceDetection {
                    confidence: 0.9,
                    bounds: BoundingBox {
                        x: 0.25,
                        y: 0.1,
                        width: 0.5,
                        height: 0.5,
                    },
                }])
            } else {
                Ok(vec![])
            }
        }
    }

    /// Hand detector showing N extended fingers, driven by the test.
    struct SharedHand {
        fingers: Arc<AtomicUsize>,
    }

    impl HandDetector for SharedHand {
        fn detect(&mut self, _frame: &Frame) -> crate::detect::error::Result<Vec<Hand>> {
            let n = self.fingers.load(Ordering::Relaxed);
            let extended: Vec<usize> = (0..n).collect();
            Ok(vec![Hand {
                landmarks: make_hand_landmarks(&extended),
                confidence: 0.9,
            }])
        }
    }

    fn fast_timing() -> FlowTiming {
        FlowTiming {
            tick_interval: Duration::from_millis(25),
            capture_delay: Duration::from_millis(10),
            poll_interval: Duration::from_millis(2),
        }
    }

    struct TestRig {
        source: Arc<SyntheticSource>,
        face: Arc<AtomicBool>,
        fingers: Arc<AtomicUsize>,
        captures: Arc<AtomicUsize>,
        flow: CaptureFlow,
    }

    fn start_rig(config: CaptureConfig) -> TestRig {
        let source = Arc::new(SyntheticSource::new());
        let face = Arc::new(AtomicBool::new(true));
        let fingers = Arc::new(AtomicUsize::new(0));
        let captures = Arc::new(AtomicUsize::new(0));

        let pipeline = DetectionPipeline::new(
            Box::new(SharedFace {
                present: Arc::clone(&face),
            }),
            Box::new(SharedHand {
                fingers: Arc::clone(&fingers),
            }),
        );

        let captures_cb = Arc::clone(&captures);
        let on_capture: CaptureCallback = Arc::new(move |_image| {
            captures_cb.fetch_add(1, Ordering::Relaxed);
        });

        let flow = CaptureFlow::start_with_timing(
            Arc::clone(&source) as Arc<dyn FrameSource>,
            pipeline,
            config,
            &StreamConstraints {
                width: 32,
                height: 32,
                ..StreamConstraints::default()
            },
            on_capture,
            fast_timing(),
        )
        .expect("flow should start");

        TestRig {
            source,
            face,
            fingers,
            captures,
            flow,
        }
    }

    /// Feed frames until the condition holds or the deadline passes.
    fn pump_until(rig: &TestRig, condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            rig.source.deliver_frame();
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(3));
        }
        false
    }

    #[test]
    fn full_sequence_captures_one_then_two() {
        let rig = start_rig(CaptureConfig::default());

        // Hold one finger until the first auto-capture
        rig.fingers.store(1, Ordering::Relaxed);
        assert!(
            pump_until(&rig, || rig.captures.load(Ordering::Relaxed) == 1),
            "first capture never fired"
        );
        assert!(pump_until(&rig, || {
            rig.flow.session_snapshot().pose_index == 1
        }));
        assert_eq!(
            rig.flow.session_snapshot().expected_pose,
            Some(PoseSymbol::Two)
        );

        // Switch to two fingers for the second pose
        rig.fingers.store(2, Ordering::Relaxed);
        assert!(
            pump_until(&rig, || rig.captures.load(Ordering::Relaxed) == 2),
            "second capture never fired"
        );
        assert!(pump_until(&rig, || {
            rig.flow.session_snapshot().state == "complete"
        }));

        // Holding the pose further must not produce extra captures
        std::thread::sleep(Duration::from_millis(100));
        for _ in 0..20 {
            rig.source.deliver_frame();
            std::thread::sleep(Duration::from_millis(3));
        }
        assert_eq!(rig.captures.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn hold_is_cancelled_when_pose_changes() {
        // Long hold so the countdown cannot finish before the test
        // changes the pose
        let rig = start_rig(CaptureConfig {
            hold_seconds: 100,
            ..CaptureConfig::default()
        });

        rig.fingers.store(1, Ordering::Relaxed);
        assert!(pump_until(&rig, || {
            rig.flow.session_snapshot().state == "holding"
        }));

        // Fist before the countdown finishes
        rig.fingers.store(0, Ordering::Relaxed);
        assert!(pump_until(&rig, || {
            rig.flow.session_snapshot().state == "waiting_for_pose"
        }));
        assert_eq!(rig.flow.session_snapshot().countdown, None);
        assert_eq!(rig.flow.diagnostics().holds_cancelled, 1);
        assert_eq!(rig.captures.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn face_loss_cancels_hold_with_correct_pose_still_shown() {
        let rig = start_rig(CaptureConfig {
            hold_seconds: 100,
            ..CaptureConfig::default()
        });

        rig.fingers.store(1, Ordering::Relaxed);
        assert!(pump_until(&rig, || {
            rig.flow.session_snapshot().state == "holding"
        }));

        rig.face.store(false, Ordering::Relaxed);
        assert!(pump_until(&rig, || {
            let snap = rig.flow.session_snapshot();
            snap.state == "waiting_for_pose" && !snap.face_detected
        }));
        assert_eq!(rig.captures.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn manual_capture_leaves_sequence_untouched() {
        let rig = start_rig(CaptureConfig::default());
        assert!(pump_until(&rig, || rig.source.sequence() > 0));

        rig.flow.manual_capture().unwrap();
        assert_eq!(rig.captures.load(Ordering::Relaxed), 1);

        let snap = rig.flow.session_snapshot();
        assert_eq!(snap.pose_index, 0);
        assert_eq!(snap.state, "waiting_for_pose");
        assert_eq!(rig.flow.diagnostics().manual_captures, 1);
    }

    #[test]
    fn manual_capture_in_complete_state_fires_each_time() {
        let rig = start_rig(CaptureConfig {
            required_poses: vec![],
            ..CaptureConfig::default()
        });
        assert_eq!(rig.flow.session_snapshot().state, "complete");
        assert!(pump_until(&rig, || rig.source.sequence() > 0));

        rig.flow.manual_capture().unwrap();
        rig.flow.manual_capture().unwrap();
        rig.flow.manual_capture().unwrap();
        assert_eq!(rig.captures.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn empty_sequence_never_auto_captures() {
        let rig = start_rig(CaptureConfig {
            required_poses: vec![],
            ..CaptureConfig::default()
        });
        rig.fingers.store(1, Ordering::Relaxed);
        for _ in 0..30 {
            rig.source.deliver_frame();
            std::thread::sleep(Duration::from_millis(3));
        }
        assert_eq!(rig.captures.load(Ordering::Relaxed), 0);
        assert_eq!(rig.flow.session_snapshot().state, "complete");
    }

    #[test]
    fn manual_capture_before_first_frame_reports_unavailable() {
        let rig = start_rig(CaptureConfig::default());
        // No frame delivered yet
        assert!(matches!(
            rig.flow.manual_capture(),
            Err(FlowError::SnapshotUnavailable)
        ));
    }

    #[test]
    fn restart_resets_sequence_progress() {
        let rig = start_rig(CaptureConfig::default());
        rig.fingers.store(1, Ordering::Relaxed);
        assert!(pump_until(&rig, || rig.captures.load(Ordering::Relaxed) == 1));
        assert!(pump_until(&rig, || {
            rig.flow.session_snapshot().pose_index == 1
        }));

        rig.flow.restart();
        let snap = rig.flow.session_snapshot();
        assert_eq!(snap.pose_index, 0);
        assert!(!snap.is_capturing);
    }

    #[test]
    fn device_unavailable_is_surfaced_as_error() {
        let source = Arc::new(SyntheticSource::unavailable());
        let pipeline = DetectionPipeline::new(
            Box::new(SharedFace {
                present: Arc::new(AtomicBool::new(true)),
            }),
            Box::new(SharedHand {
                fingers: Arc::new(AtomicUsize::new(0)),
            }),
        );
        let result = CaptureFlow::start_with_timing(
            source,
            pipeline,
            CaptureConfig::default(),
            &StreamConstraints::default(),
            Arc::new(|_| {}),
            fast_timing(),
        );
        assert!(matches!(
            result,
            Err(FlowError::Source(SourceError::DeviceUnavailable(_)))
        ));
    }

    #[test]
    fn detector_init_failure_is_fatal_to_session() {
        struct BadInit;
        impl HandDetector for BadInit {
            fn initialize(&mut self) -> crate::detect::error::Result<()> {
                Err(DetectorError::Init("model missing".to_string()))
            }
            fn detect(&mut self, _frame: &Frame) -> crate::detect::error::Result<Vec<Hand>> {
                Ok(vec![])
            }
        }

        let source = Arc::new(SyntheticSource::new());
        let pipeline = DetectionPipeline::new(
            Box::new(SharedFace {
                present: Arc::new(AtomicBool::new(true)),
            }),
            Box::new(BadInit),
        );
        let result = CaptureFlow::start_with_timing(
            source,
            pipeline,
            CaptureConfig::default(),
            &StreamConstraints::default(),
            Arc::new(|_| {}),
            fast_timing(),
        );
        assert!(matches!(
            result,
            Err(FlowError::Detector(DetectorError::Init(_)))
        ));
    }

    #[test]
    fn idle_flow_reports_camera_unavailable() {
        let source = Arc::new(SyntheticSource::unavailable());
        let flow = CaptureFlow::idle(source, CaptureConfig::default(), Arc::new(|_| {}));

        assert!(!flow.is_running());
        assert_eq!(flow.status(), "Camera unavailable");
        assert_eq!(flow.session_snapshot().state, "idle");
        assert!(matches!(
            flow.manual_capture(),
            Err(FlowError::SnapshotUnavailable)
        ));
    }

    #[test]
    fn restart_on_idle_flow_keeps_camera_unavailable_status() {
        let source = Arc::new(SyntheticSource::unavailable());
        let flow = CaptureFlow::idle(source, CaptureConfig::default(), Arc::new(|_| {}));

        flow.restart();
        assert_eq!(flow.session_snapshot().state, "idle");
        assert_eq!(flow.status(), "Camera unavailable");
    }

    #[test]
    fn stop_is_idempotent_and_halts_timers() {
        let mut rig = start_rig(CaptureConfig::default());
        rig.fingers.store(1, Ordering::Relaxed);
        assert!(pump_until(&rig, || {
            rig.flow.session_snapshot().state == "holding"
        }));

        rig.flow.stop();
        rig.flow.stop(); // Should not panic
        assert!(!rig.flow.is_running());

        // A pending hold countdown must not fire after teardown
        let before = rig.captures.load(Ordering::Relaxed);
        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(rig.captures.load(Ordering::Relaxed), before);
    }

    #[test]
    fn preview_frame_is_overlay_jpeg() {
        let rig = start_rig(CaptureConfig::default());
        rig.fingers.store(1, Ordering::Relaxed);
        assert!(pump_until(&rig, || rig.flow.diagnostics().frames_processed > 0));
        assert!(pump_until(&rig, || rig.flow.preview_frame().is_some()));

        let preview = rig.flow.preview_frame().unwrap();
        assert_eq!(preview.bytes()[0], 0xFF);
        assert_eq!(preview.bytes()[1], 0xD8);
        assert_eq!(preview.width(), 32);
    }

    #[test]
    fn diagnostics_track_holds() {
        let rig = start_rig(CaptureConfig::default());
        rig.fingers.store(1, Ordering::Relaxed);
        assert!(pump_until(&rig, || rig.flow.diagnostics().holds_started >= 1));
        assert!(rig.flow.diagnostics().frames_processed > 0);
    }

    #[test]
    fn capture_flow_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<CaptureFlow>();
    }
}
