// ActionTracker: Tracker
//
// Two rates meet here.  `update` runs once per rendered frame and feeds the
// raw readings into the smoothing buffers.  `analyze` accumulates frame time
// and fires fixed-rate analysis ticks; each tick samples the smoothed values
// into the one-second windows and steps the gesture state machine.

use std::rc::Rc;

use anyhow::Context;

use crate::config::*;
use crate::drivers::sensor::SensorSource;
use crate::events::{Axis, GestureType, HeadingReference};
use crate::gesture::{GesturePhase, GestureStateMachine, SignalWindows};
use crate::listeners::{GestureListener, ListenerRegistry};
use crate::smoothing::SmoothingBuffer;

type Smoother = SmoothingBuffer<f32, SMOOTHING_CAPACITY>;

pub struct ActionTracker {
    source: Option<Box<dyn SensorSource>>,
    heading_reference: HeadingReference,
    running: bool,

    // Per-frame smoothing
    headings: Smoother,
    accel_x: Smoother,
    accel_y: Smoother,
    accel_z: Smoother,
    sensor_fault: bool,

    // Fixed-rate analysis
    windows: SignalWindows,
    machine: GestureStateMachine,
    analysis_interval: f32,
    timer: f64,
    ticks: u64,
    last_gesture: Option<GestureType>,

    listeners: Rc<ListenerRegistry>,
}

impl ActionTracker {
    /// Tracker over `source`; `None` runs without a sensor and simply never
    /// sees motion.
    pub fn new(source: Option<Box<dyn SensorSource>>) -> Self {
        Self {
            source,
            heading_reference: HeadingReference::default(),
            running: false,
            headings: Smoother::with_branch_cut(HEADING_MODULUS),
            accel_x: Smoother::new(),
            accel_y: Smoother::new(),
            accel_z: Smoother::new(),
            sensor_fault: false,
            windows: SignalWindows::new(),
            machine: GestureStateMachine::default(),
            analysis_interval: DEFAULT_ANALYSIS_INTERVAL_S,
            timer: 0.0,
            ticks: 0,
            last_gesture: None,
            listeners: Rc::new(ListenerRegistry::new()),
        }
    }

    pub fn with_source<S: SensorSource + 'static>(source: S) -> Self {
        Self::new(Some(Box::new(source)))
    }

    /// Replace the gesture policy.  Any session in flight is dropped.
    pub fn with_thresholds(mut self, thresholds: GestureThresholds) -> Self {
        self.machine = GestureStateMachine::new(thresholds);
        self
    }

    pub fn with_heading_reference(mut self, reference: HeadingReference) -> Self {
        self.heading_reference = reference;
        self
    }

    // ---------------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------------

    /// Clear all history and activate the sensor.
    ///
    /// An activation error is returned for the caller to report, but the
    /// tracker still runs and keeps producing (motionless) ticks.
    pub fn start(&mut self) -> anyhow::Result<()> {
        if self.running {
            return Ok(());
        }

        self.headings.reset();
        self.accel_x.reset();
        self.accel_y.reset();
        self.accel_z.reset();
        self.windows = SignalWindows::new();
        self.machine.reset();
        self.timer = 0.0;
        self.sensor_fault = false;
        self.running = true;
        log::info!(
            "Action tracker started ({:.0} ms analysis interval)",
            self.analysis_interval * 1000.0
        );

        if let Some(source) = self.source.as_mut() {
            if let Err(e) = source.activate() {
                log::warn!("Sensor activation failed: {:#}", e);
                self.sensor_fault = true;
                return Err(e).context("activating sensor source");
            }
        }
        Ok(())
    }

    /// Deactivate the sensor.  A gesture in progress is discarded unreported.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        if let Some(source) = self.source.as_mut() {
            source.deactivate();
        }
        self.machine.reset();
        self.running = false;
        log::info!("Action tracker stopped after {} analysis ticks", self.ticks);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    // ---------------------------------------------------------------------------
    // Per-frame input
    // ---------------------------------------------------------------------------

    /// Pull the latest raw readings into the smoothing buffers.  A channel
    /// whose read fails keeps its previous history.
    pub fn update(&mut self) {
        if !self.running {
            return;
        }
        let Some(source) = self.source.as_mut() else {
            return;
        };

        let mut failure: Option<anyhow::Error> = None;

        if let Err(e) = source.poll() {
            failure = Some(e);
        } else {
            match source.heading_degrees(self.heading_reference) {
                Ok(heading) => self.headings.append(heading),
                Err(e) => failure = Some(e),
            }

            let channels: [(Axis, &mut Smoother); 3] = [
                (Axis::X, &mut self.accel_x),
                (Axis::Y, &mut self.accel_y),
                (Axis::Z, &mut self.accel_z),
            ];
            for (axis, buffer) in channels {
                match source.acceleration_on_axis(axis) {
                    Ok(value) => buffer.append(value),
                    Err(e) => {
                        failure.get_or_insert(e);
                    }
                }
            }
        }

        match failure {
            // Warn once per failure streak.
            Some(e) if !self.sensor_fault => {
                log::warn!("Sensor read error: {:#}", e);
                self.sensor_fault = true;
            }
            Some(_) => {}
            None if self.sensor_fault => {
                log::info!("Sensor readings recovered");
                self.sensor_fault = false;
            }
            None => {}
        }
    }

    // ---------------------------------------------------------------------------
    // Fixed-rate analysis
    // ---------------------------------------------------------------------------

    /// Advance the analysis clock by `dt` seconds and run the ticks that fall
    /// due, at most `MAX_TICKS_PER_FRAME`.  A larger backlog is dropped.
    ///
    /// Returns the number of ticks run.  Listeners are notified from inside
    /// this call and must not call back into the tracker.
    pub fn analyze(&mut self, dt: f32) -> u32 {
        if !self.running || !dt.is_finite() || dt < 0.0 {
            return 0;
        }

        let interval = f64::from(self.analysis_interval);
        self.timer += f64::from(dt);

        let mut ticks = 0;
        while self.timer + TIMER_TOLERANCE_S >= interval {
            if ticks == MAX_TICKS_PER_FRAME {
                let backlog = ((self.timer + TIMER_TOLERANCE_S) / interval).floor();
                self.timer = (self.timer - backlog * interval).max(0.0);
                log::debug!("analysis fell behind, dropped {} ticks", backlog);
                break;
            }
            self.timer -= interval;
            self.tick();
            ticks += 1;
        }
        ticks
    }

    fn tick(&mut self) {
        self.ticks += 1;

        // Windows warm-start from their first sample, which must be a reading.
        if !self.has_readings() {
            return;
        }

        self.windows.push(
            normalize_heading(self.headings.smoothed_value()),
            self.accel_y.smoothed_value(),
            self.accel_z.smoothed_value(),
        );

        if let Some(gesture) = self.machine.step(&self.windows) {
            self.last_gesture = Some(gesture);
            if gesture.is_known() {
                log::info!("Gesture complete: {}", gesture);
                self.listeners.notify_all(gesture);
            } else {
                log::debug!("gesture did not match any band, not reported");
            }
        }
    }

    fn has_readings(&self) -> bool {
        self.headings.is_warmed_up() && self.accel_y.is_warmed_up() && self.accel_z.is_warmed_up()
    }

    /// Seconds per analysis tick.  Non-positive or non-finite values are
    /// rejected and the current interval kept.
    pub fn set_analysis_interval(&mut self, seconds: f32) {
        if seconds.is_finite() && seconds > 0.0 {
            self.analysis_interval = seconds;
        } else {
            log::warn!("Ignoring invalid analysis interval {}", seconds);
        }
    }

    pub fn analysis_interval(&self) -> f32 {
        self.analysis_interval
    }

    // ---------------------------------------------------------------------------
    // Listeners
    // ---------------------------------------------------------------------------

    /// Shared handle to the registry, e.g. for a listener that unsubscribes
    /// itself from its callback.
    pub fn listeners(&self) -> Rc<ListenerRegistry> {
        Rc::clone(&self.listeners)
    }

    pub fn add_listener<L: GestureListener + 'static>(&self, listener: &Rc<L>) {
        self.listeners.add_listener(listener);
    }

    pub fn remove_listener<L: GestureListener + 'static>(&self, listener: &Rc<L>) {
        self.listeners.remove_listener(listener);
    }

    pub fn remove_all_listeners(&self) {
        self.listeners.remove_all_listeners();
    }

    // ---------------------------------------------------------------------------
    // Diagnostics
    // ---------------------------------------------------------------------------

    /// Smoothed heading in [0, 360).
    pub fn average_heading(&self) -> f32 {
        normalize_heading(self.headings.smoothed_value())
    }

    /// Smoothed [x, y, z] acceleration in g.
    pub fn average_acceleration(&self) -> [f32; 3] {
        [
            self.accel_x.smoothed_value(),
            self.accel_y.smoothed_value(),
            self.accel_z.smoothed_value(),
        ]
    }

    pub fn gesture_phase(&self) -> GesturePhase {
        self.machine.phase()
    }

    /// Analysis ticks run since construction.
    pub fn ticks_processed(&self) -> u64 {
        self.ticks
    }

    /// Last completed classification, `Unknown` included.
    pub fn last_gesture(&self) -> Option<GestureType> {
        self.last_gesture
    }

    /// One-line snapshot for an on-screen label or a log line.
    pub fn status(&self) -> String {
        let [ax, ay, az] = self.average_acceleration();
        let sensor = match &self.source {
            Some(source) => source.status(),
            None => "no sensor".to_string(),
        };
        format!(
            "{} | hdg {:5.1}° | acc {:+.2} {:+.2} {:+.2} g | {} | last {} | ticks {} | {}{}",
            if self.running { "running" } else { "stopped" },
            self.average_heading(),
            ax,
            ay,
            az,
            self.gesture_phase().display_name(),
            self.last_gesture.map_or("-", |g| g.display_name()),
            self.ticks,
            sensor,
            if self.sensor_fault { " (fault)" } else { "" },
        )
    }
}

fn normalize_heading(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(HEADING_MODULUS);
    // rem_euclid can round up to the modulus itself for tiny negatives.
    if wrapped >= HEADING_MODULUS {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::ReplaySensor;
    use crate::events::SensorSample;

    fn still_trace(heading: f32, frames: usize) -> Vec<SensorSample> {
        vec![SensorSample::new(heading, 0.0, 0.0, 0.0); frames]
    }

    #[test]
    fn stopped_tracker_does_nothing() {
        let mut tracker = ActionTracker::with_source(ReplaySensor::new(still_trace(90.0, 4)));
        tracker.update();
        assert_eq!(tracker.analyze(1.0), 0);
        assert_eq!(tracker.ticks_processed(), 0);
        assert_eq!(tracker.average_heading(), 0.0);
    }

    #[test]
    fn irregular_deltas_produce_exact_tick_count() {
        let mut tracker = ActionTracker::new(None);
        tracker.start().unwrap();

        let deltas = [0.02, 0.03, 0.05, 0.1, 0.01, 0.04, 0.075, 0.025];
        let ran: u32 = deltas.iter().map(|&dt| tracker.analyze(dt)).sum();
        assert_eq!(ran, 7);
        assert_eq!(tracker.ticks_processed(), 7);
    }

    #[test]
    fn long_irregular_run_does_not_drift() {
        let mut tracker = ActionTracker::new(None);
        tracker.set_analysis_interval(0.0625);
        tracker.start().unwrap();

        // Each cycle is exactly four intervals.
        let cycle = [0.015625, 0.046875, 0.03125, 0.09375, 0.0625];
        for _ in 0..200 {
            for &dt in &cycle {
                tracker.analyze(dt);
            }
        }
        assert_eq!(tracker.ticks_processed(), 800);
    }

    #[test]
    fn stalled_frame_is_capped_and_backlog_dropped() {
        let mut tracker = ActionTracker::new(None);
        tracker.start().unwrap();

        assert_eq!(tracker.analyze(10.0), MAX_TICKS_PER_FRAME);
        assert_eq!(tracker.analyze(0.0), 0);
        assert_eq!(tracker.analyze(0.05), 1);
    }

    #[test]
    fn bad_deltas_are_ignored() {
        let mut tracker = ActionTracker::new(None);
        tracker.start().unwrap();
        assert_eq!(tracker.analyze(-1.0), 0);
        assert_eq!(tracker.analyze(f32::NAN), 0);
        assert_eq!(tracker.analyze(f32::INFINITY), 0);
        assert_eq!(tracker.analyze(0.05), 1);
    }

    #[test]
    fn invalid_interval_is_rejected() {
        let mut tracker = ActionTracker::new(None);
        tracker.set_analysis_interval(0.0);
        tracker.set_analysis_interval(-0.1);
        tracker.set_analysis_interval(f32::NAN);
        assert_eq!(tracker.analysis_interval(), DEFAULT_ANALYSIS_INTERVAL_S);
        tracker.set_analysis_interval(0.1);
        assert_eq!(tracker.analysis_interval(), 0.1);
    }

    #[test]
    fn heading_is_smoothed_across_north() {
        let mut frames = Vec::new();
        for i in 0..40 {
            frames.push(SensorSample::new(if i % 2 == 0 { 358.0 } else { 2.0 }, 0.0, 0.0, 0.0));
        }
        let mut tracker = ActionTracker::with_source(ReplaySensor::new(frames));
        tracker.start().unwrap();
        for _ in 0..40 {
            tracker.update();
        }
        let heading = tracker.average_heading();
        assert!((0.0..360.0).contains(&heading));
        assert!(heading < 3.0 || heading > 357.0, "heading {}", heading);
    }

    #[test]
    fn absent_sensor_keeps_running() {
        let mut tracker = ActionTracker::new(None);
        tracker.start().unwrap();
        for _ in 0..30 {
            tracker.update();
            tracker.analyze(0.05);
        }
        assert_eq!(tracker.ticks_processed(), 30);
        assert_eq!(tracker.average_heading(), 0.0);
        assert!(tracker.status().contains("no sensor"));
    }

    struct FlakySensor {
        frame: u32,
        fail_from: u32,
    }

    impl SensorSource for FlakySensor {
        fn poll(&mut self) -> anyhow::Result<()> {
            self.frame += 1;
            Ok(())
        }

        fn heading_degrees(&mut self, _reference: HeadingReference) -> anyhow::Result<f32> {
            if self.frame >= self.fail_from {
                anyhow::bail!("compass lost");
            }
            Ok(45.0)
        }

        fn acceleration_on_axis(&mut self, axis: Axis) -> anyhow::Result<f32> {
            Ok(match axis {
                Axis::X => 0.1,
                Axis::Y => 0.2,
                Axis::Z => 0.3,
            })
        }

        fn status(&self) -> String {
            format!("flaky frame {}", self.frame)
        }
    }

    #[test]
    fn failed_channel_keeps_last_value() {
        let mut tracker = ActionTracker::with_source(FlakySensor { frame: 0, fail_from: 4 });
        tracker.start().unwrap();
        for _ in 0..20 {
            tracker.update();
            tracker.analyze(0.05);
        }
        assert_eq!(tracker.average_heading(), 45.0);
        let [ax, ay, az] = tracker.average_acceleration();
        assert_eq!((ax, ay, az), (0.1, 0.2, 0.3));
        assert_eq!(tracker.ticks_processed(), 20);
        assert!(tracker.status().contains("(fault)"));
    }

    struct DeadSensor;

    impl SensorSource for DeadSensor {
        fn activate(&mut self) -> anyhow::Result<()> {
            anyhow::bail!("no motion hardware")
        }

        fn poll(&mut self) -> anyhow::Result<()> {
            anyhow::bail!("no motion hardware")
        }

        fn heading_degrees(&mut self, _reference: HeadingReference) -> anyhow::Result<f32> {
            anyhow::bail!("no compass")
        }

        fn acceleration_on_axis(&mut self, _axis: Axis) -> anyhow::Result<f32> {
            anyhow::bail!("no accelerometer")
        }

        fn status(&self) -> String {
            "dead".to_string()
        }
    }

    #[test]
    fn activation_failure_degrades_instead_of_failing() {
        let mut tracker = ActionTracker::with_source(DeadSensor);
        assert!(tracker.start().is_err());
        assert!(tracker.is_running());
        for _ in 0..10 {
            tracker.update();
            tracker.analyze(0.05);
        }
        assert_eq!(tracker.ticks_processed(), 10);
        assert_eq!(tracker.gesture_phase(), GesturePhase::Idle);
    }

    struct LateFixSensor {
        polls: u32,
        fix_after: u32,
        activation_fails: bool,
    }

    impl LateFixSensor {
        fn has_fix(&self) -> bool {
            self.polls > self.fix_after
        }
    }

    impl SensorSource for LateFixSensor {
        fn activate(&mut self) -> anyhow::Result<()> {
            if self.activation_fails {
                anyhow::bail!("sensor busy");
            }
            Ok(())
        }

        fn poll(&mut self) -> anyhow::Result<()> {
            self.polls += 1;
            Ok(())
        }

        fn heading_degrees(&mut self, _reference: HeadingReference) -> anyhow::Result<f32> {
            if !self.has_fix() {
                anyhow::bail!("no heading fix");
            }
            Ok(200.0)
        }

        fn acceleration_on_axis(&mut self, _axis: Axis) -> anyhow::Result<f32> {
            if self.activation_fails && !self.has_fix() {
                anyhow::bail!("accelerometer not ready");
            }
            Ok(0.0)
        }

        fn status(&self) -> String {
            format!("late fix poll {}", self.polls)
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: std::cell::RefCell<Vec<GestureType>>,
    }

    impl GestureListener for Recorder {
        fn on_gesture_complete(&self, gesture: GestureType) {
            self.seen.borrow_mut().push(gesture);
        }
    }

    fn run_motionless(sensor: LateFixSensor) -> (ActionTracker, Rc<Recorder>, bool) {
        let activation_fails = sensor.activation_fails;
        let mut tracker = ActionTracker::with_source(sensor);
        let recorder = Rc::new(Recorder::default());
        tracker.add_listener(&recorder);
        assert_eq!(tracker.start().is_err(), activation_fails);

        let mut left_idle = false;
        for _ in 0..300 {
            tracker.update();
            tracker.analyze(1.0 / 60.0);
            left_idle |= tracker.gesture_phase() != GesturePhase::Idle;
        }
        (tracker, recorder, left_idle)
    }

    #[test]
    fn late_heading_fix_is_not_a_gesture() {
        let (tracker, recorder, left_idle) = run_motionless(LateFixSensor {
            polls: 0,
            fix_after: 30,
            activation_fails: false,
        });
        assert!(recorder.seen.borrow().is_empty());
        assert!(!left_idle);
        assert_eq!(tracker.last_gesture(), None);
        assert_eq!(tracker.average_heading(), 200.0);
        assert_eq!(tracker.ticks_processed(), 100);
    }

    #[test]
    fn recovery_after_failed_activation_is_not_a_gesture() {
        let (tracker, recorder, left_idle) = run_motionless(LateFixSensor {
            polls: 0,
            fix_after: 45,
            activation_fails: true,
        });
        assert!(recorder.seen.borrow().is_empty());
        assert!(!left_idle);
        assert_eq!(tracker.last_gesture(), None);
        assert!(!tracker.status().contains("(fault)"));
    }

    #[test]
    fn status_reports_state() {
        let mut tracker = ActionTracker::with_source(ReplaySensor::new(still_trace(123.0, 2)));
        assert!(tracker.status().starts_with("stopped"));
        tracker.start().unwrap();
        tracker.update();
        let status = tracker.status();
        assert!(status.starts_with("running"), "{}", status);
        assert!(status.contains("hdg 123.0°"), "{}", status);
        assert!(status.contains("idle"), "{}", status);
        assert!(status.contains("replay 1/2"), "{}", status);
        tracker.stop();
        assert!(!tracker.is_running());
    }
}
