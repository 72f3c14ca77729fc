// ActionTracker: Tuning & System Configuration
//
// Rates, buffer sizes and the default gesture policy.  Angles are in degrees,
// accelerations in g, impulses in g·s.

// ---------------------------------------------------------------------------
// Analysis Rate
// ---------------------------------------------------------------------------
pub const SAMPLES_PER_SECOND: usize = 20;
pub const DEFAULT_ANALYSIS_INTERVAL_S: f32 = 1.0 / SAMPLES_PER_SECOND as f32; // 50 ms
pub const MAX_TICKS_PER_FRAME: u32 = 5; // catch-up cap for a stalled frame
pub const TIMER_TOLERANCE_S: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Buffers
// ---------------------------------------------------------------------------
pub const SMOOTHING_CAPACITY: usize = 16; // frames per moving average
pub const WINDOW_LEN: usize = SAMPLES_PER_SECOND; // one second of analysis ticks
pub const HEADING_MODULUS: f32 = 360.0;

// ---------------------------------------------------------------------------
// Lookbacks (analysis samples)
// ---------------------------------------------------------------------------
pub const START_LOOKBACK: usize = WINDOW_LEN / 4;
pub const CONFIRM_SAMPLES: usize = WINDOW_LEN / 2;
pub const MAX_SESSION_AGE: usize = WINDOW_LEN - 1; // start slot is about to be overwritten

// ---------------------------------------------------------------------------
// Hysteresis (entry > continue > exit)
// ---------------------------------------------------------------------------
pub const HEADING_START_DEG: f32 = 20.0;
pub const HEADING_CONTINUE_DEG: f32 = 12.0;
pub const HEADING_STOP_DEG: f32 = 6.0;

pub const ACCEL_Y_START_G: f32 = 0.5;
pub const ACCEL_Y_CONTINUE_G: f32 = 0.3;
pub const ACCEL_Y_STOP_G: f32 = 0.15;

// ---------------------------------------------------------------------------
// Classification bands
// ---------------------------------------------------------------------------
pub const CHOP_MIN_Z_IMPULSE: f32 = 0.5;
pub const CHOP_MAX_HEADING_DEG: f32 = 30.0;
pub const CHOP_MAX_DURATION_SAMPLES: usize = MAX_SESSION_AGE - 1; // must end on its own

pub const SLASH_MIN_HEADING_DEG: f32 = 60.0;
pub const SLASH_MIN_ACCEL_Y_G: f32 = 0.8;
pub const SLASH_MAX_Z_IMPULSE: f32 = 0.25;

pub const CUT_MIN_Z_IMPULSE: f32 = 0.25;
pub const CUT_MIN_RMS_HEADING_DEG: f32 = 15.0;

/// Gesture policy: hysteresis thresholds plus classification bands.
///
/// The defaults mirror the constants above. They were tuned against synthetic
/// traces driven at 60 frames per second; smoothing depth is counted in
/// frames, so much lower frame rates flatten short accelerations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureThresholds {
    pub heading_start: f32,
    pub heading_continue: f32,
    pub heading_stop: f32,
    pub accel_y_start: f32,
    pub accel_y_continue: f32,
    pub accel_y_stop: f32,
    pub chop_min_z_impulse: f32,
    pub chop_max_heading: f32,
    /// Longest session, in analysis samples, that still counts as a chop.
    pub chop_max_duration: usize,
    pub slash_min_heading: f32,
    pub slash_min_accel_y: f32,
    pub slash_max_z_impulse: f32,
    pub cut_min_z_impulse: f32,
    pub cut_min_rms_heading: f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            heading_start: HEADING_START_DEG,
            heading_continue: HEADING_CONTINUE_DEG,
            heading_stop: HEADING_STOP_DEG,
            accel_y_start: ACCEL_Y_START_G,
            accel_y_continue: ACCEL_Y_CONTINUE_G,
            accel_y_stop: ACCEL_Y_STOP_G,
            chop_min_z_impulse: CHOP_MIN_Z_IMPULSE,
            chop_max_heading: CHOP_MAX_HEADING_DEG,
            chop_max_duration: CHOP_MAX_DURATION_SAMPLES,
            slash_min_heading: SLASH_MIN_HEADING_DEG,
            slash_min_accel_y: SLASH_MIN_ACCEL_Y_G,
            slash_max_z_impulse: SLASH_MAX_Z_IMPULSE,
            cut_min_z_impulse: CUT_MIN_Z_IMPULSE,
            cut_min_rms_heading: CUT_MIN_RMS_HEADING_DEG,
        }
    }
}
