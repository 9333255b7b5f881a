//! Synthetic landmark streams: scripted poses for every exercise, with
//! optional seeded jitter. Used for demos without a camera and for tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::exercise::ExerciseMode;
use crate::landmark::{BodyPart, Joint, Landmark, LandmarkFrame};
use crate::runtime::FrameSample;

/// Upper arm, forearm and shin length in normalized units
const LIMB: f64 = 0.12;
const SHIN: f64 = 0.2;

const PUSHUP_REP: [f64; 8] = [170.0, 170.0, 130.0, 85.0, 75.0, 85.0, 130.0, 170.0];
const SQUAT_REP: [f64; 7] = [0.5, 0.6, 0.75, 0.78, 0.75, 0.6, 0.5];
const LUNGE_REP: [(f64, f64); 6] = [
    (178.0, 178.0),
    (140.0, 160.0),
    (80.0, 100.0),
    (80.0, 100.0),
    (140.0, 160.0),
    (178.0, 178.0),
];

/// Builds side-view frames in image coordinates (y grows downward).
#[derive(Debug, Clone, Copy)]
pub struct SyntheticPose {
    pub visibility: f64,
}

impl Default for SyntheticPose {
    fn default() -> Self {
        Self { visibility: 0.95 }
    }
}

impl SyntheticPose {
    fn put(&self, frame: &mut LandmarkFrame, joint: Joint, x: f64, y: f64) {
        frame.set(joint, Landmark::new(x, y, Some(self.visibility)));
    }

    fn pair(&self, frame: &mut LandmarkFrame, part: BodyPart, x: f64, y: f64) {
        let (left, right) = part.joints();
        self.put(frame, left, x, y);
        self.put(frame, right, x, y);
    }

    /// Body lying along y = 0.5, head on the left, hips at `hip_y`
    fn lying(&self, hip_y: f64, elbow_angle: f64) -> LandmarkFrame {
        let mut f = LandmarkFrame::blank();
        self.pair(&mut f, BodyPart::Shoulders, 0.2, 0.5);
        self.pair(&mut f, BodyPart::Hips, 0.5, hip_y);
        self.pair(&mut f, BodyPart::Knees, 0.65, 0.5);
        self.pair(&mut f, BodyPart::Ankles, 0.8, 0.5);

        // upper arm hangs straight down, forearm swings by the elbow angle
        let rad = elbow_angle.to_radians();
        let (ex, ey) = (0.2, 0.5 + LIMB);
        let (wx, wy) = (ex + LIMB * rad.sin(), ey - LIMB * rad.cos());
        self.pair(&mut f, BodyPart::Elbows, ex, ey);
        self.pair(&mut f, BodyPart::Wrists, wx, wy);
        f
    }

    /// Push-up with a straight body line and the given elbow angle
    pub fn pushup(&self, elbow_angle: f64) -> LandmarkFrame {
        self.lying(0.5, elbow_angle)
    }

    /// Push-up with the hips piked high
    pub fn bad_pushup(&self, elbow_angle: f64) -> LandmarkFrame {
        self.lying(0.25, elbow_angle)
    }

    /// Forearm plank; a bad one sags at the hips
    pub fn plank(&self, good: bool) -> LandmarkFrame {
        self.lying(if good { 0.5 } else { 0.65 }, 90.0)
    }

    pub fn squat(&self, deep: bool) -> LandmarkFrame {
        self.squat_at(if deep { 0.75 } else { 0.5 })
    }

    /// Front view, knees at y = 0.7 and ankles at y = 0.9
    pub fn squat_at(&self, hip_y: f64) -> LandmarkFrame {
        let mut f = LandmarkFrame::blank();
        for ((left, right), x_left, x_right, y) in [
            (BodyPart::Shoulders.joints(), 0.44, 0.56, hip_y - 0.3),
            (BodyPart::Hips.joints(), 0.46, 0.54, hip_y),
            (BodyPart::Knees.joints(), 0.42, 0.58, 0.7),
            (BodyPart::Ankles.joints(), 0.44, 0.56, 0.9),
        ] {
            self.put(&mut f, left, x_left, y);
            self.put(&mut f, right, x_right, y);
        }
        f
    }

    /// Hips stay above the knees; each shin swings out by its knee angle
    pub fn lunge(&self, left_knee_angle: f64, right_knee_angle: f64) -> LandmarkFrame {
        let mut f = LandmarkFrame::blank();
        self.put(&mut f, Joint::LeftShoulder, 0.48, 0.15);
        self.put(&mut f, Joint::RightShoulder, 0.52, 0.15);

        for (hip, knee, ankle, x, side, angle) in [
            (Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle, 0.48, 1.0, left_knee_angle),
            (Joint::RightHip, Joint::RightKnee, Joint::RightAnkle, 0.52, -1.0, right_knee_angle),
        ] {
            let rad = angle.to_radians();
            let knee_y = 0.45 + SHIN;
            self.put(&mut f, hip, x, 0.45);
            self.put(&mut f, knee, x, knee_y);
            self.put(
                &mut f,
                ankle,
                x + side * SHIN * rad.sin(),
                knee_y - SHIN * rad.cos(),
            );
        }
        f
    }
}

/// Uniform positional noise from a seeded generator
pub struct Jitter {
    rng: StdRng,
    amount: f64,
}

impl Jitter {
    /// Non-finite amounts disable the noise
    pub fn new(amount: f64, seed: u64) -> Self {
        let amount = if amount.is_finite() {
            amount.abs()
        } else {
            log::warn!("ignoring non-finite jitter {amount}");
            0.0
        };
        Self {
            rng: StdRng::seed_from_u64(seed),
            amount,
        }
    }

    pub fn apply(&mut self, frame: &LandmarkFrame) -> LandmarkFrame {
        if self.amount == 0.0 {
            return frame.clone();
        }
        let a = self.amount;
        let landmarks = frame
            .landmarks()
            .iter()
            .map(|lm| {
                Landmark::new(
                    lm.x + self.rng.gen_range(-a..=a),
                    lm.y + self.rng.gen_range(-a..=a),
                    lm.visibility,
                )
            })
            .collect();
        LandmarkFrame::new(landmarks)
    }
}

/// A scripted workout: `reps` repetitions (seconds of holding, for plank)
/// sampled every `interval_ms`.
pub fn workout(
    mode: ExerciseMode,
    reps: u32,
    interval_ms: u64,
    jitter: f64,
    seed: u64,
) -> Vec<FrameSample> {
    let pose = SyntheticPose::default();
    let interval_ms = interval_ms.max(1);

    let frames: Vec<LandmarkFrame> = match mode {
        ExerciseMode::PushUps => (0..reps)
            .flat_map(|_| PUSHUP_REP.iter().map(|a| pose.pushup(*a)))
            .collect(),
        ExerciseMode::Squats => (0..reps)
            .flat_map(|_| SQUAT_REP.iter().map(|y| pose.squat_at(*y)))
            .collect(),
        ExerciseMode::Lunges => (0..reps)
            .flat_map(|_| LUNGE_REP.iter().map(|(l, r)| pose.lunge(*l, *r)))
            .collect(),
        ExerciseMode::Plank => {
            let n = u64::from(reps) * 1000 / interval_ms + 1;
            (0..n).map(|_| pose.plank(true)).collect()
        }
    };

    let mut noise = Jitter::new(jitter, seed);
    let samples: Vec<FrameSample> = frames
        .iter()
        .enumerate()
        .map(|(i, f)| FrameSample::tracked(i as u64 * interval_ms, noise.apply(f)))
        .collect();

    log::debug!(
        "synthesized {} {} frames (jitter {jitter}, seed {seed})",
        samples.len(),
        mode
    );
    samples
}
