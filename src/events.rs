// ActionTracker: Sensor Samples & Gesture Events

// ---------------------------------------------------------------------------
// Sensor Data (one compass + accelerometer reading)
// ---------------------------------------------------------------------------
/// Raw reading as delivered by a sensor source.  Heading in degrees
/// [0, 360), accelerations in g with gravity removed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSample {
    pub heading: f32,
    pub ax: f32,
    pub ay: f32,
    pub az: f32,
}

impl SensorSample {
    pub fn new(heading: f32, ax: f32, ay: f32, az: f32) -> Self {
        Self { heading, ax, ay, az }
    }

    pub fn acceleration(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.ax,
            Axis::Y => self.ay,
            Axis::Z => self.az,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Which north the compass reports against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingReference {
    #[default]
    Magnetic,
    True,
}

// ---------------------------------------------------------------------------
// Gesture Classification
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureType {
    /// No band matched.  Never dispatched to listeners.
    Unknown,
    Chop,
    Cut,
    Slash,
}

impl GestureType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Chop => "chop",
            Self::Cut => "cut",
            Self::Slash => "slash",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl Default for GestureType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl std::fmt::Display for GestureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
