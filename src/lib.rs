// Library surface for the CLI and for headless/integration tests.
// Everything below `session` is pure and clock-free; time comes in as `now_ms`.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod events;
pub mod exercise;
pub mod geometry;
pub mod hold_timer;
pub mod landmark;
pub mod posture;
pub mod report;
pub mod reps;
pub mod runtime;
pub mod session;
pub mod synth;

pub use config::CoachConfig;
pub use error::CoachError;
pub use events::{CoachEvent, CoachListener};
pub use exercise::ExerciseMode;
pub use landmark::{Joint, Landmark, LandmarkFrame};
pub use session::WorkoutSession;
