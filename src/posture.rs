//! Per-frame body alignment check for the active exercise.

use crate::config::{CoachConfig, PlankConfig};
use crate::exercise::ExerciseMode;
use crate::geometry::{abs_cos_between, angle_at, is_near_horizontal, Point};
use crate::landmark::{BodyPart, Joint, LandmarkFrame};
use serde::{Deserialize, Serialize};

/// Minimum |cos| between the upper and lower body line for a push-up
pub const PUSHUP_STRAIGHT_ABS_COS_MIN: f64 = 0.90;

/// Joints both push-ups and planks need before alignment can be judged
const BODY_LINE_JOINTS: [Joint; 6] = [
    Joint::LeftShoulder,
    Joint::RightShoulder,
    Joint::LeftHip,
    Joint::RightHip,
    Joint::LeftKnee,
    Joint::RightKnee,
];

/// Result of classifying a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostureVerdict {
    Correct,
    Incorrect,
    /// A required joint was missing or below the visibility threshold
    NotEvaluable,
}

/// Posture as reported to listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PostureStatus {
    Correct,
    Incorrect,
    #[default]
    Unknown,
}

impl From<PostureVerdict> for PostureStatus {
    fn from(v: PostureVerdict) -> Self {
        match v {
            PostureVerdict::Correct => PostureStatus::Correct,
            PostureVerdict::Incorrect => PostureStatus::Incorrect,
            PostureVerdict::NotEvaluable => PostureStatus::Unknown,
        }
    }
}

/// Stateless classifier; thresholds come from the session config.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostureClassifier {
    plank: PlankConfig,
}

impl PostureClassifier {
    pub fn new(config: &CoachConfig) -> Self {
        Self {
            plank: config.plank,
        }
    }

    pub fn evaluate(&self, frame: &LandmarkFrame, mode: ExerciseMode) -> PostureVerdict {
        match mode {
            // Rep detection alone drives feedback for these two
            ExerciseMode::Squats | ExerciseMode::Lunges => PostureVerdict::Correct,
            ExerciseMode::PushUps => self.evaluate_pushup(frame),
            ExerciseMode::Plank => self.evaluate_plank(frame),
        }
    }

    fn evaluate_pushup(&self, frame: &LandmarkFrame) -> PostureVerdict {
        match body_line(frame) {
            Some(line) => verdict(line.abs_cos() >= PUSHUP_STRAIGHT_ABS_COS_MIN),
            None => PostureVerdict::NotEvaluable,
        }
    }

    fn evaluate_plank(&self, frame: &LandmarkFrame) -> PostureVerdict {
        let Some(line) = body_line(frame) else {
            return PostureVerdict::NotEvaluable;
        };

        let straight = line.abs_cos() >= self.plank.straight_abs_cos_min;
        let torso = line.hip_center.to(line.shoulder_center);
        let horizontal = is_near_horizontal(torso, self.plank.horiz_max_deg);
        let knees_ok = if line.uses_ankles {
            knee_angles(frame).map_or(true, |(l, r)| {
                l >= self.plank.knee_min_deg && r >= self.plank.knee_min_deg
            })
        } else {
            true
        };

        verdict(straight && horizontal && knees_ok)
    }
}

fn verdict(ok: bool) -> PostureVerdict {
    if ok {
        PostureVerdict::Correct
    } else {
        PostureVerdict::Incorrect
    }
}

struct BodyLine {
    shoulder_center: Point,
    hip_center: Point,
    target: Point,
    uses_ankles: bool,
}

impl BodyLine {
    fn abs_cos(&self) -> f64 {
        abs_cos_between(
            self.hip_center.to(self.shoulder_center),
            self.hip_center.to(self.target),
        )
    }
}

/// Shoulder, hip and lower anchor centers. The anchor is the ankle center
/// when both ankles are tracked, otherwise the knee center.
fn body_line(frame: &LandmarkFrame) -> Option<BodyLine> {
    if !frame.all_tracked(&BODY_LINE_JOINTS) {
        return None;
    }
    let shoulder_center = frame.center(BodyPart::Shoulders)?;
    let hip_center = frame.center(BodyPart::Hips)?;
    let (target, uses_ankles) = match frame.center(BodyPart::Ankles) {
        Some(ankles) => (ankles, true),
        None => (frame.center(BodyPart::Knees)?, false),
    };

    Some(BodyLine {
        shoulder_center,
        hip_center,
        target,
        uses_ankles,
    })
}

/// Hip-knee-ankle angle on each side
pub(crate) fn knee_angles(frame: &LandmarkFrame) -> Option<(f64, f64)> {
    let left = angle_at(
        frame.tracked(Joint::LeftHip)?,
        frame.tracked(Joint::LeftKnee)?,
        frame.tracked(Joint::LeftAnkle)?,
    );
    let right = angle_at(
        frame.tracked(Joint::RightHip)?,
        frame.tracked(Joint::RightKnee)?,
        frame.tracked(Joint::RightAnkle)?,
    );
    Some((left, right))
}
