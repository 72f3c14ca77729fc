// ActionTracker: Synthetic Traces
//
// Builds frame-by-frame sensor traces of idealized gestures for the replay
// sensor.  Segments are appended in order; each starts from the heading the
// previous one ended on.

use crate::events::SensorSample;

pub struct TraceBuilder {
    fps: f32,
    heading: f32,
    frames: Vec<SensorSample>,
}

impl TraceBuilder {
    pub fn new(fps: f32, heading: f32) -> Self {
        Self {
            fps: fps.max(1.0),
            heading: heading.rem_euclid(360.0),
            frames: Vec::new(),
        }
    }

    /// Hold the current heading with no acceleration.
    pub fn still(self, seconds: f32) -> Self {
        let heading = self.heading;
        self.segment(seconds, |_| (heading, 0.0, 0.0))
    }

    /// Arm drops along Y and back (0.5 s) with a hard 3 g Z burst while down.
    pub fn chop(self) -> Self {
        let heading = self.heading;
        self.segment(1.0, |t| {
            let y = if t < 0.4 {
                ramp(t, 0.0, 0.1, 0.0, 1.0)
            } else {
                ramp(t, 0.4, 0.5, 1.0, 0.0)
            };
            let z = if (0.15..0.4).contains(&t) { 3.0 } else { 0.0 };
            (heading, y, z)
        })
    }

    /// Steady 45° turn over half a second with moderate Z.
    pub fn cut(mut self) -> Self {
        let from = self.heading;
        self = self.segment(0.5, |t| (ramp(t, 0.0, 0.5, from, from + 45.0), 0.0, 0.8));
        self.heading = (from + 45.0).rem_euclid(360.0);
        self
    }

    /// Fast 120° sweep in 0.3 s, no Z.
    pub fn slash(mut self) -> Self {
        let from = self.heading;
        self = self.segment(0.3, |t| (ramp(t, 0.0, 0.3, from, from + 120.0), 0.0, 0.0));
        self.heading = (from + 120.0).rem_euclid(360.0);
        self
    }

    /// Jump the heading by `degrees` for `seconds`, then come back.
    pub fn heading_spike(self, degrees: f32, seconds: f32) -> Self {
        let heading = self.heading;
        self.segment(seconds, |_| (heading + degrees, 0.0, 0.0))
    }

    pub fn build(self) -> Vec<SensorSample> {
        self.frames
    }

    fn segment(mut self, seconds: f32, shape: impl Fn(f32) -> (f32, f32, f32)) -> Self {
        let count = (seconds * self.fps).round() as usize;
        for k in 0..count {
            let (heading, ay, az) = shape(k as f32 / self.fps);
            self.frames
                .push(SensorSample::new(heading.rem_euclid(360.0), 0.0, ay, az));
        }
        self
    }
}

fn ramp(t: f32, t0: f32, t1: f32, a: f32, b: f32) -> f32 {
    if t <= t0 {
        a
    } else if t >= t1 {
        b
    } else {
        a + (b - a) * (t - t0) / (t1 - t0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_have_expected_length() {
        let frames = TraceBuilder::new(60.0, 10.0).still(1.0).chop().slash().build();
        assert_eq!(frames.len(), 60 + 60 + 18);
    }

    #[test]
    fn slash_wraps_heading() {
        let frames = TraceBuilder::new(60.0, 300.0).slash().still(0.1).build();
        let last = frames.last().unwrap();
        assert!((last.heading - 60.0).abs() < 1e-3);
        assert!(frames.iter().all(|f| (0.0..360.0).contains(&f.heading)));
    }

    #[test]
    fn chop_returns_to_rest() {
        let frames = TraceBuilder::new(60.0, 0.0).chop().build();
        let peak = frames.iter().map(|f| f.ay).fold(0.0f32, f32::max);
        assert_eq!(peak, 1.0);
        assert_eq!(frames.last().unwrap().ay, 0.0);
        assert_eq!(frames.last().unwrap().az, 0.0);
    }
}
