//! Up/down repetition state machines for the counted exercises.
//!
//! Push-ups count on the way back up (Down -> Up). Squats and lunges count as
//! soon as the descent is detected (Up -> Down) and only re-arm once the user
//! is standing again.

use crate::config::CoachConfig;
use crate::exercise::ExerciseMode;
use crate::geometry::angle_at;
use crate::landmark::{BodyPart, Joint, LandmarkFrame};
use crate::posture::knee_angles;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    #[default]
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepCounterState {
    pub phase: Phase,
    pub count: u32,
}

/// A phase transition produced by one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub from: Phase,
    pub to: Phase,
    /// New total when this transition completed a rep
    pub counted: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RepCounter {
    mode: ExerciseMode,
    config: CoachConfig,
    state: RepCounterState,
}

impl RepCounter {
    pub fn new(mode: ExerciseMode, config: &CoachConfig) -> Self {
        Self {
            mode,
            config: *config,
            state: RepCounterState::default(),
        }
    }

    pub fn mode(&self) -> ExerciseMode {
        self.mode
    }

    pub fn state(&self) -> RepCounterState {
        self.state
    }

    pub fn count(&self) -> u32 {
        self.state.count
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn reset(&mut self) {
        self.state = RepCounterState::default();
    }

    /// Advances the state machine by one frame. Frames missing a required
    /// joint leave the state untouched.
    pub fn update(&mut self, frame: &LandmarkFrame) -> Option<PhaseChange> {
        match self.mode {
            ExerciseMode::PushUps => {
                let angle = average_elbow_angle(frame)?;
                self.update_pushup(angle)
            }
            ExerciseMode::Squats => {
                let hip_y = frame.center(BodyPart::Hips)?.y;
                let knee_y = frame.center(BodyPart::Knees)?.y;
                self.log_squat_depth(frame);
                self.update_squat(hip_y, knee_y)
            }
            ExerciseMode::Lunges => self.update_lunge(frame),
            ExerciseMode::Plank => None,
        }
    }

    /// Hysteresis between `elbow_angle_down` and `elbow_angle_up`; counts on the way up.
    pub fn update_pushup(&mut self, avg_elbow_angle: f64) -> Option<PhaseChange> {
        let cfg = self.config.pushups;
        match self.state.phase {
            Phase::Up if avg_elbow_angle < cfg.elbow_angle_down => self.transition(Phase::Down, false),
            Phase::Down if avg_elbow_angle > cfg.elbow_angle_up => self.transition(Phase::Up, true),
            _ => None,
        }
    }

    /// Image y grows downward, so `hip_y > knee_y` means the hips dropped
    /// below the knee line.
    pub fn update_squat(&mut self, hip_y: f64, knee_y: f64) -> Option<PhaseChange> {
        match self.state.phase {
            Phase::Up if hip_y > knee_y => self.transition(Phase::Down, true),
            Phase::Down if hip_y < knee_y => self.transition(Phase::Up, false),
            _ => None,
        }
    }

    fn update_lunge(&mut self, frame: &LandmarkFrame) -> Option<PhaseChange> {
        let (left_angle, right_angle) = knee_angles(frame)?;
        let hip_y = frame.center(BodyPart::Hips)?.y;

        // The more bent knee is the front leg
        let (front_angle, back_angle, front_knee) = if left_angle < right_angle {
            (left_angle, right_angle, Joint::LeftKnee)
        } else {
            (right_angle, left_angle, Joint::RightKnee)
        };
        let front_knee_y = frame.tracked(front_knee)?.y;

        let cfg = self.config.lunges;
        let lunging = front_angle <= cfg.front_knee_angle_down
            || back_angle <= cfg.back_knee_angle_down
            || hip_y > front_knee_y;
        let standing =
            front_angle >= cfg.front_knee_angle_up && back_angle >= cfg.back_knee_angle_up;

        match self.state.phase {
            Phase::Up if lunging => self.transition(Phase::Down, true),
            Phase::Down if standing => self.transition(Phase::Up, false),
            _ => None,
        }
    }

    fn transition(&mut self, to: Phase, counts: bool) -> Option<PhaseChange> {
        let from = self.state.phase;
        self.state.phase = to;
        let counted = if counts {
            self.state.count += 1;
            Some(self.state.count)
        } else {
            None
        };

        log::debug!(
            "{}: {} -> {}{}",
            self.mode,
            from,
            to,
            counted.map_or(String::new(), |n| format!(" (rep {n})"))
        );

        Some(PhaseChange { from, to, counted })
    }

    fn log_squat_depth(&self, frame: &LandmarkFrame) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        if let Some((l, r)) = knee_angles(frame) {
            let knee = (l + r) / 2.0;
            let cfg = self.config.squats;
            if knee <= cfg.knee_angle_down {
                log::debug!("squat depth reached: knee angle {knee:.1}");
            } else if knee >= cfg.knee_angle_up {
                log::trace!("standing tall: knee angle {knee:.1}");
            }
        }
    }
}

/// Mean of the left and right shoulder-elbow-wrist angles
pub fn average_elbow_angle(frame: &LandmarkFrame) -> Option<f64> {
    let left = angle_at(
        frame.tracked(Joint::LeftShoulder)?,
        frame.tracked(Joint::LeftElbow)?,
        frame.tracked(Joint::LeftWrist)?,
    );
    let right = angle_at(
        frame.tracked(Joint::RightShoulder)?,
        frame.tracked(Joint::RightElbow)?,
        frame.tracked(Joint::RightWrist)?,
    );
    Some((left + right) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::SyntheticPose;

    fn counter(mode: ExerciseMode) -> RepCounter {
        RepCounter::new(mode, &CoachConfig::default())
    }

    #[test]
    fn test_pushup_counts_on_return_to_up() {
        let mut c = counter(ExerciseMode::PushUps);
        let angles = [170.0, 170.0, 80.0, 80.0, 170.0];
        let mut counted_at = vec![];

        for (i, a) in angles.iter().enumerate() {
            if let Some(PhaseChange {
                counted: Some(n), ..
            }) = c.update_pushup(*a)
            {
                counted_at.push((i, n));
            }
        }

        assert_eq!(counted_at, vec![(4, 1)]);
        assert_eq!(c.count(), 1);
        assert_eq!(c.phase(), Phase::Up);
    }

    #[test]
    fn test_pushup_descent_changes_phase_without_counting() {
        let mut c = counter(ExerciseMode::PushUps);
        let change = c.update_pushup(85.0).unwrap();
        assert_eq!(change.from, Phase::Up);
        assert_eq!(change.to, Phase::Down);
        assert_eq!(change.counted, None);
        assert_eq!(c.count(), 0);
    }

    #[test]
    fn test_pushup_hysteresis_band_holds() {
        let mut c = counter(ExerciseMode::PushUps);
        for a in [170.0, 120.0, 170.0, 120.0] {
            assert!(c.update_pushup(a).is_none());
        }
        assert_eq!(c.phase(), Phase::Up);
        assert_eq!(c.count(), 0);

        // once down, wobbling inside the band does not count either
        c.update_pushup(80.0);
        for a in [120.0, 150.0, 100.0, 159.9] {
            assert!(c.update_pushup(a).is_none());
        }
        assert_eq!(c.count(), 0);
    }

    #[test]
    fn test_pushup_thresholds_are_strict() {
        let mut c = counter(ExerciseMode::PushUps);
        assert!(c.update_pushup(90.0).is_none());
        assert!(c.update_pushup(89.9).is_some());
        assert!(c.update_pushup(160.0).is_none());
        assert!(c.update_pushup(160.1).is_some());
    }

    #[test]
    fn test_pushup_custom_thresholds() {
        let mut cfg = CoachConfig::default();
        cfg.pushups.elbow_angle_down = 110.0;
        cfg.pushups.elbow_angle_up = 150.0;
        let mut c = RepCounter::new(ExerciseMode::PushUps, &cfg);
        c.update_pushup(105.0);
        let change = c.update_pushup(155.0).unwrap();
        assert_eq!(change.counted, Some(1));
    }

    #[test]
    fn test_pushup_from_frames() {
        let pose = SyntheticPose::default();
        let mut c = counter(ExerciseMode::PushUps);
        for angle in [170.0, 80.0, 170.0, 75.0, 172.0] {
            c.update(&pose.pushup(angle));
        }
        assert_eq!(c.count(), 2);
    }

    #[test]
    fn test_pushup_missing_arm_is_skipped() {
        let pose = SyntheticPose::default();
        let mut c = counter(ExerciseMode::PushUps);
        let mut frame = pose.pushup(80.0);
        frame.set(
            Joint::LeftWrist,
            crate::landmark::Landmark::new(0.0, 0.0, Some(0.1)),
        );
        assert!(c.update(&frame).is_none());
        assert_eq!(c.phase(), Phase::Up);
    }

    #[test]
    fn test_squat_counts_on_descent() {
        let mut c = counter(ExerciseMode::Squats);
        assert!(c.update_squat(0.5, 0.7).is_none());
        let down = c.update_squat(0.75, 0.7).unwrap();
        assert_eq!(down.counted, Some(1));
        assert!(c.update_squat(0.76, 0.7).is_none());
        let up = c.update_squat(0.5, 0.7).unwrap();
        assert_eq!(up.counted, None);
        assert_eq!(c.count(), 1);
    }

    #[test]
    fn test_squat_level_hips_do_not_transition() {
        let mut c = counter(ExerciseMode::Squats);
        assert!(c.update_squat(0.7, 0.7).is_none());
        c.update_squat(0.8, 0.7);
        assert!(c.update_squat(0.7, 0.7).is_none());
        assert_eq!(c.phase(), Phase::Down);
    }

    #[test]
    fn test_squats_from_frames() {
        let pose = SyntheticPose::default();
        let mut c = counter(ExerciseMode::Squats);
        for deep in [false, true, true, false, true, false] {
            c.update(&pose.squat(deep));
        }
        assert_eq!(c.count(), 2);
    }

    #[test]
    fn test_lunge_counts_on_descent_and_rearms_standing() {
        let pose = SyntheticPose::default();
        let mut c = counter(ExerciseMode::Lunges);

        assert!(c.update(&pose.lunge(178.0, 178.0)).is_none());
        let down = c.update(&pose.lunge(80.0, 120.0)).unwrap();
        assert_eq!(down.counted, Some(1));

        // half way up is not standing
        assert!(c.update(&pose.lunge(140.0, 170.0)).is_none());
        assert_eq!(c.phase(), Phase::Down);

        let up = c.update(&pose.lunge(175.0, 175.0)).unwrap();
        assert_eq!(up.to, Phase::Up);
        assert_eq!(c.count(), 1);
    }

    #[test]
    fn test_lunge_back_knee_alone_triggers() {
        let pose = SyntheticPose::default();
        let mut c = counter(ExerciseMode::Lunges);
        // front knee stops short of 85, back knee reaches 89
        let change = c.update(&pose.lunge(88.0, 89.0)).unwrap();
        assert_eq!(change.counted, Some(1));
    }

    #[test]
    fn test_lunge_hips_below_front_knee_triggers() {
        use crate::landmark::Landmark;
        let mut frame = LandmarkFrame::blank();
        for (joint, x, y) in [
            (Joint::LeftHip, 0.30, 0.70),
            (Joint::LeftKnee, 0.40, 0.65),
            (Joint::LeftAnkle, 0.50, 0.70),
            (Joint::RightHip, 0.70, 0.70),
            (Joint::RightKnee, 0.60, 0.66),
            (Joint::RightAnkle, 0.50, 0.70),
        ] {
            frame.set(joint, Landmark::new(x, y, Some(0.9)));
        }
        // both knees stay open (~127 and ~136 degrees)
        let (l, r) = knee_angles(&frame).unwrap();
        assert!(l > 85.0 && r > 90.0);

        let mut c = counter(ExerciseMode::Lunges);
        let change = c.update(&frame).unwrap();
        assert_eq!(change.to, Phase::Down);
        assert_eq!(change.counted, Some(1));
    }

    #[test]
    fn test_lunge_stays_down_until_back_knee_straightens() {
        let pose = SyntheticPose::default();
        let mut cfg = CoachConfig::default();
        cfg.lunges.back_knee_angle_up = 175.0;
        let mut c = RepCounter::new(ExerciseMode::Lunges, &cfg);

        c.update(&pose.lunge(80.0, 120.0));
        assert_eq!(c.phase(), Phase::Down);

        // front knee is past 160 but the back knee is short of 175
        assert!(c.update(&pose.lunge(165.0, 170.0)).is_none());
        assert_eq!(c.phase(), Phase::Down);

        let up = c.update(&pose.lunge(176.0, 178.0)).unwrap();
        assert_eq!(up.to, Phase::Up);
        assert_eq!(c.count(), 1);
    }

    #[test]
    fn test_plank_never_counts() {
        let pose = SyntheticPose::default();
        let mut c = counter(ExerciseMode::Plank);
        assert!(c.update(&pose.plank(true)).is_none());
        assert!(c.update(&pose.pushup(60.0)).is_none());
        assert_eq!(c.count(), 0);
    }

    #[test]
    fn test_reset() {
        let mut c = counter(ExerciseMode::PushUps);
        c.update_pushup(80.0);
        c.update_pushup(170.0);
        c.update_pushup(80.0);
        assert_eq!(c.state(), RepCounterState { phase: Phase::Down, count: 1 });
        c.reset();
        assert_eq!(c.state(), RepCounterState::default());
    }
}
