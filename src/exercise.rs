use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Exercise being tracked in the current workout segment
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExerciseMode {
    #[default]
    #[value(name = "pushups")]
    PushUps,
    Squats,
    Lunges,
    Plank,
}

impl ExerciseMode {
    /// Lenient name lookup; unknown names fall back to push-ups
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "plank" => ExerciseMode::Plank,
            "squat" | "squats" => ExerciseMode::Squats,
            "lunge" | "lunges" => ExerciseMode::Lunges,
            _ => ExerciseMode::PushUps,
        }
    }

    /// Isometric exercises are measured by held time instead of reps
    pub fn is_timed(self) -> bool {
        self == ExerciseMode::Plank
    }

    pub fn all() -> [ExerciseMode; 4] {
        [
            ExerciseMode::PushUps,
            ExerciseMode::Squats,
            ExerciseMode::Lunges,
            ExerciseMode::Plank,
        ]
    }
}
