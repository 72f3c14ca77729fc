// ActionTracker: Gesture State Machine
//
// Idle -> Starting -> Active -> Idle, stepped once per analysis tick after the
// heading / accel-Y / accel-Z windows have received their sample.  Entry,
// confirmation and exit use separate thresholds so one noisy sample cannot
// toggle a session.

use crate::classifier::{assess_gesture, GestureSummary};
use crate::config::*;
use crate::events::GestureType;
use crate::window::SlidingWindow;

// ---------------------------------------------------------------------------
// Analysis windows
// ---------------------------------------------------------------------------

/// The three smoothed signals the state machine looks at, one window each.
#[derive(Debug, Clone)]
pub struct SignalWindows {
    pub heading: SlidingWindow<WINDOW_LEN>,
    pub accel_y: SlidingWindow<WINDOW_LEN>,
    pub accel_z: SlidingWindow<WINDOW_LEN>,
}

impl SignalWindows {
    pub fn new() -> Self {
        Self {
            heading: SlidingWindow::circular(HEADING_MODULUS),
            accel_y: SlidingWindow::new(),
            accel_z: SlidingWindow::new(),
        }
    }

    pub fn push(&mut self, heading: f32, accel_y: f32, accel_z: f32) {
        self.heading.push(heading);
        self.accel_y.push(accel_y);
        self.accel_z.push(accel_z);
    }

    /// All windows advance together, so any of them gives the slot.
    pub fn latest_index(&self) -> usize {
        self.heading.latest_index()
    }
}

impl Default for SignalWindows {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A gesture in progress, anchored at the window slot where the excursion
/// began.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSession {
    pub start_index: usize,
    pub start_heading: f32,
    pub start_accel_y: f32,
    /// Sum of |z| over every sample since `start_index`.
    pub accel_z_accumulator: f32,
    /// Samples elapsed since `start_index`.
    pub age: usize,
}

impl GestureSession {
    fn open(windows: &SignalWindows, start_index: usize, latest: usize) -> Self {
        Self {
            start_index,
            start_heading: windows.heading.value_at(start_index),
            start_accel_y: windows.accel_y.value_at(start_index),
            accel_z_accumulator: windows.accel_z.absolute_sum(start_index, latest),
            age: windows.heading.span(start_index, latest),
        }
    }

    fn advance(&mut self, windows: &SignalWindows, latest: usize) {
        self.age += 1;
        self.accumulate_accel_z(windows, latest);
    }

    fn accumulate_accel_z(&mut self, windows: &SignalWindows, latest: usize) {
        self.accel_z_accumulator += windows.accel_z.value_at(latest).abs();
    }

    /// Current |heading - onset heading|, wrapped at 360°.
    pub fn heading_displacement(&self, windows: &SignalWindows, latest: usize) -> f32 {
        windows.heading.displacement_from(self.start_heading, latest).abs()
    }

    pub fn accel_displacement(&self, windows: &SignalWindows, latest: usize) -> f32 {
        windows.accel_y.displacement_from(self.start_accel_y, latest).abs()
    }

    /// Measure the session for classification.
    pub fn summarize(&self, windows: &SignalWindows, latest: usize) -> GestureSummary {
        let start = self.start_index;
        GestureSummary {
            peak_heading: windows.heading.max_displacement(start, latest),
            rms_heading: windows.heading.rms_displacement(start, latest),
            peak_accel_y: windows.accel_y.max_displacement(start, latest),
            z_impulse: self.accel_z_accumulator / SAMPLES_PER_SECOND as f32,
            duration_samples: self.age,
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    /// Waiting for a start.  Disarmed until the signals have been quiet for
    /// one start lookback after the previous session.
    Idle { armed: bool },
    /// Excursion detected, not yet confirmed.
    Starting(GestureSession),
    /// Confirmed; waiting for the stop or the window boundary.
    Active(GestureSession),
}

/// Session-free view of `GestureState` for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GesturePhase {
    Idle,
    Starting,
    Active,
}

impl GesturePhase {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Active => "active",
        }
    }
}

pub struct GestureStateMachine {
    state: GestureState,
    thresholds: GestureThresholds,
}

impl GestureStateMachine {
    pub fn new(thresholds: GestureThresholds) -> Self {
        Self {
            state: GestureState::Idle { armed: true },
            thresholds,
        }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn phase(&self) -> GesturePhase {
        match self.state {
            GestureState::Idle { .. } => GesturePhase::Idle,
            GestureState::Starting(_) => GesturePhase::Starting,
            GestureState::Active(_) => GesturePhase::Active,
        }
    }

    pub fn session(&self) -> Option<&GestureSession> {
        match &self.state {
            GestureState::Starting(session) | GestureState::Active(session) => Some(session),
            GestureState::Idle { .. } => None,
        }
    }

    pub fn thresholds(&self) -> &GestureThresholds {
        &self.thresholds
    }

    /// Drop any session in flight.  No classification, no event.
    pub fn reset(&mut self) {
        if self.session().is_some() {
            log::debug!("gesture session abandoned");
        }
        self.state = GestureState::Idle { armed: true };
    }

    /// Advance one analysis tick.
    ///
    /// Returns the classification when a session completes on this tick,
    /// `Unknown` included; `None` on every other tick.
    pub fn step(&mut self, windows: &SignalWindows) -> Option<GestureType> {
        let latest = windows.latest_index();

        match self.state {
            GestureState::Idle { armed: false } => {
                if self.is_quiet(windows, latest) {
                    self.state = GestureState::Idle { armed: true };
                }
                None
            }

            GestureState::Idle { armed: true } => {
                if let Some(session) = self.check_for_gesture_start(windows, latest) {
                    log::debug!(
                        "gesture start at slot {} (heading {:.1}°, accel y {:.2}g)",
                        session.start_index,
                        session.start_heading,
                        session.start_accel_y
                    );
                    self.state = GestureState::Starting(session);
                }
                None
            }

            GestureState::Starting(mut session) => {
                session.advance(windows, latest);
                self.state = if !self.check_for_gesture_continue(&session, windows, latest) {
                    log::debug!("false start after {} samples", session.age);
                    GestureState::Idle { armed: false }
                } else if session.age >= CONFIRM_SAMPLES {
                    log::debug!("gesture confirmed after {} samples", session.age);
                    GestureState::Active(session)
                } else {
                    GestureState::Starting(session)
                };
                None
            }

            GestureState::Active(mut session) => {
                session.advance(windows, latest);
                let stopped = self.check_for_heading_stop(&session, windows, latest)
                    || self.check_for_accel_stop(&session, windows, latest);

                if stopped || session.age >= MAX_SESSION_AGE {
                    if !stopped {
                        log::debug!("gesture forced complete at window boundary");
                    }
                    let summary = session.summarize(windows, latest);
                    self.state = GestureState::Idle { armed: false };
                    Some(assess_gesture(&summary, &self.thresholds))
                } else {
                    self.state = GestureState::Active(session);
                    None
                }
            }
        }
    }

    // ---- transitions ----

    // Either signal moved past its start bar within the short lookback.
    fn check_for_gesture_start(
        &self,
        windows: &SignalWindows,
        latest: usize,
    ) -> Option<GestureSession> {
        let from = windows.heading.index_back(latest, START_LOOKBACK);
        let heading = windows.heading.max_displacement(from, latest);
        let accel_y = windows.accel_y.max_displacement(from, latest);

        if heading > self.thresholds.heading_start || accel_y > self.thresholds.accel_y_start {
            Some(GestureSession::open(windows, from, latest))
        } else {
            None
        }
    }

    // The excursion is still held by at least one signal.
    fn check_for_gesture_continue(
        &self,
        session: &GestureSession,
        windows: &SignalWindows,
        latest: usize,
    ) -> bool {
        session.heading_displacement(windows, latest) >= self.thresholds.heading_continue
            || session.accel_displacement(windows, latest) >= self.thresholds.accel_y_continue
    }

    // Heading took part in the gesture and has come back to where it began.
    fn check_for_heading_stop(
        &self,
        session: &GestureSession,
        windows: &SignalWindows,
        latest: usize,
    ) -> bool {
        let peak = windows.heading.max_displacement(session.start_index, latest);
        peak >= self.thresholds.heading_start
            && session.heading_displacement(windows, latest) < self.thresholds.heading_stop
    }

    fn check_for_accel_stop(
        &self,
        session: &GestureSession,
        windows: &SignalWindows,
        latest: usize,
    ) -> bool {
        let peak = windows.accel_y.max_displacement(session.start_index, latest);
        peak >= self.thresholds.accel_y_start
            && session.accel_displacement(windows, latest) < self.thresholds.accel_y_stop
    }

    fn is_quiet(&self, windows: &SignalWindows, latest: usize) -> bool {
        let from = windows.heading.index_back(latest, START_LOOKBACK);
        windows.heading.max_displacement(from, latest) < self.thresholds.heading_stop
            && windows.accel_y.max_displacement(from, latest) < self.thresholds.accel_y_stop
    }
}

impl Default for GestureStateMachine {
    fn default() -> Self {
        Self::new(GestureThresholds::default())
    }
}
