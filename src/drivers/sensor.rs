// ActionTracker: Sensor Source Seam
//
// The platform layer (compass + accelerometer drivers) plugs in here.  The
// tracker never fails because of a source: a failed read keeps the last
// known value for that channel.

use crate::events::{Axis, HeadingReference};

/// Raw heading and acceleration provider.
///
/// Headings are degrees in [0, 360) and may wrap between reads.
/// Accelerations are in g with gravity removed.
pub trait SensorSource {
    /// Power up / subscribe.  Called from `ActionTracker::start`.
    fn activate(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Power down / unsubscribe.  Called from `ActionTracker::stop`.
    fn deactivate(&mut self) {}

    /// Refresh readings once per frame, before the channel reads.  Burst-read
    /// devices fetch all axes here; push-based sources can leave it empty.
    fn poll(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn heading_degrees(&mut self, reference: HeadingReference) -> anyhow::Result<f32>;

    fn acceleration_on_axis(&mut self, axis: Axis) -> anyhow::Result<f32>;

    /// Human-readable diagnostics line.
    fn status(&self) -> String;
}
