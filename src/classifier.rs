// ActionTracker: Gesture Classifier
//
// Maps the measurements of one completed gesture session onto a gesture
// type.  Pure policy: the same summary and thresholds always give the same
// answer, and `Unknown` is a legitimate result.

use crate::config::GestureThresholds;
use crate::events::GestureType;

// ---------------------------------------------------------------------------
// Public interface
// ---------------------------------------------------------------------------

/// Measurements of a completed session, taken from the analysis windows
/// between the excursion onset and the completing tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GestureSummary {
    /// Largest heading displacement from the onset heading (degrees).
    pub peak_heading: f32,
    /// RMS heading displacement from the onset heading (degrees).
    pub rms_heading: f32,
    /// Largest accel-Y displacement from the onset value (g).
    pub peak_accel_y: f32,
    /// Integrated |z| acceleration over the session (g·s).
    pub z_impulse: f32,
    /// Samples from onset to completion.
    pub duration_samples: usize,
}

/// Classify a completed session.
///
/// Bands are checked in order CHOP, SLASH, CUT, so a strong z burst with
/// little rotation is a chop even when the arm also travelled sideways.
pub fn assess_gesture(summary: &GestureSummary, thresholds: &GestureThresholds) -> GestureType {
    let gesture = if is_chop(summary, thresholds) {
        GestureType::Chop
    } else if is_slash(summary, thresholds) {
        GestureType::Slash
    } else if is_cut(summary, thresholds) {
        GestureType::Cut
    } else {
        GestureType::Unknown
    };

    log::debug!(
        "assess: peak heading {:.1}° rms {:.1}° peak y {:.2}g z {:.3}g·s len {} -> {}",
        summary.peak_heading,
        summary.rms_heading,
        summary.peak_accel_y,
        summary.z_impulse,
        summary.duration_samples,
        gesture
    );
    gesture
}

// ---------------------------------------------------------------------------
// Bands
// ---------------------------------------------------------------------------

// Large, brief z spike with the heading held.
fn is_chop(s: &GestureSummary, t: &GestureThresholds) -> bool {
    s.z_impulse >= t.chop_min_z_impulse
        && s.peak_heading < t.chop_max_heading
        && s.duration_samples <= t.chop_max_duration
}

// Wide sweep (heading or lateral) without much z.
fn is_slash(s: &GestureSummary, t: &GestureThresholds) -> bool {
    (s.peak_heading >= t.slash_min_heading || s.peak_accel_y >= t.slash_min_accel_y)
        && s.z_impulse < t.slash_max_z_impulse
}

// Sustained moderate rotation with moderate z.
fn is_cut(s: &GestureSummary, t: &GestureThresholds) -> bool {
    s.z_impulse >= t.cut_min_z_impulse && s.rms_heading >= t.cut_min_rms_heading
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_SESSION_AGE;

    fn summary(
        peak_heading: f32,
        rms_heading: f32,
        peak_accel_y: f32,
        z_impulse: f32,
    ) -> GestureSummary {
        GestureSummary {
            peak_heading,
            rms_heading,
            peak_accel_y,
            z_impulse,
            duration_samples: 15,
        }
    }

    #[test]
    fn chop_band() {
        let t = GestureThresholds::default();
        assert_eq!(assess_gesture(&summary(2.0, 1.0, 1.0, 0.75), &t), GestureType::Chop);
    }

    #[test]
    fn chop_wins_over_lateral_slash() {
        let t = GestureThresholds::default();
        // Large lateral travel would be a slash, but the z burst marks a chop.
        assert_eq!(assess_gesture(&summary(0.0, 0.0, 1.2, 0.9), &t), GestureType::Chop);
    }

    #[test]
    fn drawn_out_z_push_is_not_a_chop() {
        let t = GestureThresholds::default();
        let held = GestureSummary {
            duration_samples: MAX_SESSION_AGE,
            ..summary(2.0, 1.0, 1.0, 0.75)
        };
        assert_eq!(assess_gesture(&held, &t), GestureType::Unknown);

        let brief = GestureSummary {
            duration_samples: t.chop_max_duration,
            ..held
        };
        assert_eq!(assess_gesture(&brief, &t), GestureType::Chop);
    }

    #[test]
    fn slash_band_by_heading_and_by_lateral_travel() {
        let t = GestureThresholds::default();
        assert_eq!(assess_gesture(&summary(120.0, 90.0, 0.0, 0.0), &t), GestureType::Slash);
        assert_eq!(assess_gesture(&summary(0.0, 0.0, 1.2, 0.1), &t), GestureType::Slash);
    }

    #[test]
    fn cut_band() {
        let t = GestureThresholds::default();
        assert_eq!(assess_gesture(&summary(38.0, 30.0, 0.0, 0.35), &t), GestureType::Cut);
        // A wide sweep with moderate z is still a cut, not a slash.
        assert_eq!(assess_gesture(&summary(90.0, 60.0, 0.0, 0.4), &t), GestureType::Cut);
    }

    #[test]
    fn weak_session_is_unknown() {
        let t = GestureThresholds::default();
        assert_eq!(assess_gesture(&summary(33.0, 28.0, 0.0, 0.0), &t), GestureType::Unknown);
        assert_eq!(assess_gesture(&GestureSummary::default(), &t), GestureType::Unknown);
    }

    #[test]
    fn thresholds_are_policy() {
        let strict = GestureThresholds {
            chop_min_z_impulse: 5.0,
            ..GestureThresholds::default()
        };
        assert_eq!(assess_gesture(&summary(2.0, 1.0, 0.2, 0.75), &strict), GestureType::Unknown);
    }
}
