// ActionTracker: Demo Entry Point
//
// Synthesizes a scripted gesture trace, replays it through the tracker one
// frame at a time and logs every gesture the listeners receive.
//
//   action-tracker --fps 60 --jitter 0.3 chop cut slash
//
// RUST_LOG overrides the log level (e.g. RUST_LOG=action_tracker=debug).

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use action_tracker::drivers::TraceBuilder;
use action_tracker::{ActionTracker, GestureListener, GestureType, HeadingReference, ReplaySensor};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Replay synthetic CHOP / CUT / SLASH gestures through the gesture tracker
#[derive(Parser, Debug)]
#[command(name = "action-tracker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Gestures to perform, in order
    #[arg(
        value_enum,
        value_delimiter = ',',
        default_values_t = [Move::Chop, Move::Cut, Move::Slash]
    )]
    gestures: Vec<Move>,

    /// Render frame rate of the simulated host (below ~45 fps a chop gets too few frames)
    #[arg(
        short,
        long,
        default_value_t = 60,
        value_parser = clap::value_parser!(u32).range(10..=240)
    )]
    fps: u32,

    /// Frame time jitter as a fraction of the frame period (0.0 - 0.9)
    #[arg(short, long, default_value_t = 0.0)]
    jitter: f32,

    /// Starting compass heading in degrees
    #[arg(long, default_value_t = 90.0)]
    heading: f32,

    /// Magnetic declination applied when reading true heading
    #[arg(long)]
    declination: Option<f32>,

    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Move {
    Chop,
    Cut,
    Slash,
}

impl Move {
    fn expected(self) -> GestureType {
        match self {
            Move::Chop => GestureType::Chop,
            Move::Cut => GestureType::Cut,
            Move::Slash => GestureType::Slash,
        }
    }
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

#[derive(Default)]
struct GestureLog {
    received: RefCell<Vec<GestureType>>,
}

impl GestureListener for GestureLog {
    fn on_gesture_complete(&self, gesture: GestureType) {
        let mut received = self.received.borrow_mut();
        received.push(gesture);
        log::info!(">>> {} (#{})", gesture, received.len());
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if !(0.0..0.9).contains(&cli.jitter) {
        anyhow::bail!("jitter must be in [0.0, 0.9), got {}", cli.jitter);
    }

    let fps = cli.fps as f32;
    let mut builder = TraceBuilder::new(fps, cli.heading).still(1.0);
    for &gesture in &cli.gestures {
        builder = match gesture {
            Move::Chop => builder.chop(),
            Move::Cut => builder.cut(),
            Move::Slash => builder.slash(),
        }
        .still(1.0);
    }
    let frames = builder.still(0.5).build();
    let frame_count = frames.len();
    log::info!(
        "Replaying {} frames ({:.1} s at {} fps, jitter {:.0}%)",
        frame_count,
        frame_count as f32 / fps,
        cli.fps,
        cli.jitter * 100.0
    );

    let mut tracker = match cli.declination {
        Some(declination) => {
            ActionTracker::with_source(ReplaySensor::new(frames).with_declination(declination))
                .with_heading_reference(HeadingReference::True)
        }
        None => ActionTracker::with_source(ReplaySensor::new(frames)),
    };
    let gesture_log = Rc::new(GestureLog::default());
    tracker.add_listener(&gesture_log);
    tracker.start().context("starting tracker")?;

    // Alternate long and short frames so every pair still spans two periods.
    let period = 1.0 / fps;
    for frame in 0..frame_count {
        let skew = if frame % 2 == 0 { cli.jitter } else { -cli.jitter };
        tracker.update();
        tracker.analyze(period * (1.0 + skew));

        if cli.verbose && frame % cli.fps as usize == 0 {
            log::debug!("{}", tracker.status());
        }
    }

    log::info!("{}", tracker.status());
    tracker.stop();

    let expected: Vec<GestureType> = cli.gestures.iter().map(|g| g.expected()).collect();
    let received = gesture_log.received.borrow();
    if *received == expected {
        log::info!("All {} gestures recognised", expected.len());
    } else {
        let names = |list: &[GestureType]| {
            list.iter().map(|g| g.display_name()).collect::<Vec<_>>().join(", ")
        };
        log::warn!(
            "Recognised [{}], expected [{}]",
            names(&received),
            names(&expected)
        );
    }
    Ok(())
}
