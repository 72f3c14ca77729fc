// ActionTracker: Replay Sensor
//
// Plays back a recorded (or synthesized) trace, one frame per `poll`.  Once
// the trace runs out the last frame is held, like a device that stopped
// moving.

use anyhow::{bail, Context};

use crate::drivers::sensor::SensorSource;
use crate::events::{Axis, HeadingReference, SensorSample};

pub struct ReplaySensor {
    frames: Vec<SensorSample>,
    position: Option<usize>,
    declination: f32,
    active: bool,
}

impl ReplaySensor {
    pub fn new(frames: Vec<SensorSample>) -> Self {
        Self {
            frames,
            position: None,
            declination: 0.0,
            active: false,
        }
    }

    /// Offset added to the recorded (magnetic) heading when true north is
    /// requested.
    pub fn with_declination(mut self, degrees: f32) -> Self {
        self.declination = degrees;
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames consumed so far.
    pub fn position(&self) -> usize {
        self.position.map_or(0, |p| p + 1)
    }

    pub fn is_exhausted(&self) -> bool {
        self.position() >= self.frames.len()
    }

    fn current(&self) -> anyhow::Result<&SensorSample> {
        if !self.active {
            bail!("replay sensor not active");
        }
        let index = self.position.context("replay sensor not polled yet")?;
        self.frames.get(index).context("replay trace is empty")
    }
}

impl SensorSource for ReplaySensor {
    fn activate(&mut self) -> anyhow::Result<()> {
        if self.frames.is_empty() {
            bail!("replay trace is empty");
        }
        self.active = true;
        log::debug!("replay sensor activated ({} frames)", self.frames.len());
        Ok(())
    }

    fn deactivate(&mut self) {
        self.active = false;
    }

    fn poll(&mut self) -> anyhow::Result<()> {
        if !self.active {
            bail!("replay sensor not active");
        }
        let last = self.frames.len().saturating_sub(1);
        self.position = Some(self.position.map_or(0, |p| (p + 1).min(last)));
        Ok(())
    }

    fn heading_degrees(&mut self, reference: HeadingReference) -> anyhow::Result<f32> {
        let heading = self.current()?.heading;
        Ok(match reference {
            HeadingReference::Magnetic => heading,
            HeadingReference::True => (heading + self.declination).rem_euclid(360.0),
        })
    }

    fn acceleration_on_axis(&mut self, axis: Axis) -> anyhow::Result<f32> {
        Ok(self.current()?.acceleration(axis))
    }

    fn status(&self) -> String {
        if self.active {
            format!("replay {}/{}", self.position(), self.frames.len())
        } else {
            "replay inactive".to_string()
        }
    }
}
