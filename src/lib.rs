//! Gesture detection core.
//!
//! Turns per-frame compass heading and acceleration readings into CHOP, CUT
//! and SLASH events:
//!
//! ```text
//! SensorSource --update()--> SmoothingBuffer x4 --analyze(dt)--> SlidingWindow x3
//!        --> GestureStateMachine --> ListenerRegistry --> GestureListener
//! ```
//!
//! ```no_run
//! use std::rc::Rc;
//! use action_tracker::{ActionTracker, GestureListener, GestureType, ReplaySensor, SensorSample};
//!
//! struct Printer;
//! impl GestureListener for Printer {
//!     fn on_gesture_complete(&self, gesture: GestureType) {
//!         println!("{}", gesture);
//!     }
//! }
//!
//! let trace = vec![SensorSample::new(90.0, 0.0, 0.0, 0.0); 600];
//! let mut tracker = ActionTracker::with_source(ReplaySensor::new(trace));
//! let printer = Rc::new(Printer);
//! tracker.add_listener(&printer);
//! tracker.start().unwrap();
//! for _ in 0..600 {
//!     tracker.update();
//!     tracker.analyze(1.0 / 60.0);
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod drivers;
pub mod events;
pub mod gesture;
pub mod listeners;
pub mod smoothing;
pub mod tracker;
pub mod window;

pub use classifier::{assess_gesture, GestureSummary};
pub use config::GestureThresholds;
pub use drivers::{ReplaySensor, SensorSource};
pub use events::{Axis, GestureType, HeadingReference, SensorSample};
pub use gesture::{GesturePhase, GestureSession, GestureState, GestureStateMachine, SignalWindows};
pub use listeners::{GestureListener, ListenerRegistry};
pub use smoothing::SmoothingBuffer;
pub use tracker::ActionTracker;
pub use window::SlidingWindow;
