pub mod replay;
pub mod sensor;
pub mod synth;

pub use replay::ReplaySensor;
pub use sensor::SensorSource;
pub use synth::TraceBuilder;
