use crate::geometry::{midpoint, Point};
use serde::{Deserialize, Serialize};

/// Number of landmarks in one frame from the upstream pose convention
pub const LANDMARK_COUNT: usize = 33;

/// Joints at or below this visibility are treated as untracked
pub const VISIBILITY_MIN: f64 = 0.5;

/// Named joint roles, in the upstream provider's index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Joint {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl Joint {
    /// Position of this joint inside a frame
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Left/right joint pairs the counters average over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyPart {
    Shoulders,
    Elbows,
    Wrists,
    Hips,
    Knees,
    Ankles,
}

impl BodyPart {
    pub fn joints(self) -> (Joint, Joint) {
        match self {
            BodyPart::Shoulders => (Joint::LeftShoulder, Joint::RightShoulder),
            BodyPart::Elbows => (Joint::LeftElbow, Joint::RightElbow),
            BodyPart::Wrists => (Joint::LeftWrist, Joint::RightWrist),
            BodyPart::Hips => (Joint::LeftHip, Joint::RightHip),
            BodyPart::Knees => (Joint::LeftKnee, Joint::RightKnee),
            BodyPart::Ankles => (Joint::LeftAnkle, Joint::RightAnkle),
        }
    }
}

/// A single tracked joint, coordinates normalized to the video frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64, visibility: Option<f64>) -> Self {
        Self { x, y, visibility }
    }

    /// A missing visibility score counts as tracked
    pub fn is_tracked(&self) -> bool {
        self.visibility.map_or(true, |v| v > VISIBILITY_MIN)
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// One complete set of landmarks for a single instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkFrame {
    landmarks: Vec<Landmark>,
}

impl LandmarkFrame {
    /// Wraps whatever the provider delivered. Short frames are allowed; joints
    /// past the end simply read as missing.
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// Full-size frame with every joint untracked at the origin
    pub fn blank() -> Self {
        Self {
            landmarks: vec![Landmark::new(0.0, 0.0, Some(0.0)); LANDMARK_COUNT],
        }
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn get(&self, joint: Joint) -> Option<&Landmark> {
        self.landmarks.get(joint.index())
    }

    /// Overwrites one joint, growing the frame if it is short
    pub fn set(&mut self, joint: Joint, landmark: Landmark) {
        let idx = joint.index();
        if idx >= self.landmarks.len() {
            self.landmarks
                .resize(idx + 1, Landmark::new(0.0, 0.0, Some(0.0)));
        }
        self.landmarks[idx] = landmark;
    }

    /// Position of a joint only if it is present and tracked
    pub fn tracked(&self, joint: Joint) -> Option<Point> {
        self.get(joint)
            .filter(|lm| lm.is_tracked())
            .map(Landmark::point)
    }

    pub fn is_tracked(&self, joint: Joint) -> bool {
        self.tracked(joint).is_some()
    }

    pub fn all_tracked(&self, joints: &[Joint]) -> bool {
        joints.iter().all(|j| self.is_tracked(*j))
    }

    /// Tracked positions of both sides of a body part
    pub fn pair(&self, part: BodyPart) -> Option<(Point, Point)> {
        let (left, right) = part.joints();
        Some((self.tracked(left)?, self.tracked(right)?))
    }

    /// Midpoint of a body part; `None` unless both sides are tracked
    pub fn center(&self, part: BodyPart) -> Option<Point> {
        self.pair(part).map(|(l, r)| midpoint(l, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_indices_follow_upstream_order() {
        assert_eq!(Joint::Nose.index(), 0);
        assert_eq!(Joint::LeftShoulder.index(), 11);
        assert_eq!(Joint::RightShoulder.index(), 12);
        assert_eq!(Joint::LeftElbow.index(), 13);
        assert_eq!(Joint::RightWrist.index(), 16);
        assert_eq!(Joint::LeftHip.index(), 23);
        assert_eq!(Joint::RightKnee.index(), 26);
        assert_eq!(Joint::RightAnkle.index(), 28);
        assert_eq!(Joint::RightFootIndex.index(), LANDMARK_COUNT - 1);
    }

    #[test]
    fn test_joint_display() {
        assert_eq!(Joint::LeftShoulder.to_string(), "left_shoulder");
    }

    #[test]
    fn test_visibility_rule() {
        assert!(Landmark::new(0.1, 0.1, None).is_tracked());
        assert!(Landmark::new(0.1, 0.1, Some(0.51)).is_tracked());
        assert!(!Landmark::new(0.1, 0.1, Some(0.5)).is_tracked());
        assert!(!Landmark::new(0.1, 0.1, Some(0.0)).is_tracked());
    }

    #[test]
    fn test_blank_frame_has_nothing_tracked() {
        let frame = LandmarkFrame::blank();
        assert_eq!(frame.len(), LANDMARK_COUNT);
        assert!(frame.tracked(Joint::LeftHip).is_none());
        assert!(frame.center(BodyPart::Hips).is_none());
    }

    #[test]
    fn test_center_needs_both_sides() {
        let mut frame = LandmarkFrame::blank();
        frame.set(Joint::LeftHip, Landmark::new(0.4, 0.6, Some(0.9)));
        assert!(frame.center(BodyPart::Hips).is_none());

        frame.set(Joint::RightHip, Landmark::new(0.6, 0.8, Some(0.9)));
        let c = frame.center(BodyPart::Hips).unwrap();
        assert!((c.x - 0.5).abs() < 1e-12);
        assert!((c.y - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_short_frame_reads_missing() {
        let frame = LandmarkFrame::new(vec![Landmark::new(0.5, 0.5, None); 12]);
        assert!(frame.is_tracked(Joint::LeftShoulder));
        assert!(frame.get(Joint::LeftHip).is_none());
        assert!(!frame.all_tracked(&[Joint::LeftShoulder, Joint::LeftHip]));
    }

    #[test]
    fn test_set_grows_short_frame() {
        let mut frame = LandmarkFrame::new(vec![]);
        frame.set(Joint::LeftKnee, Landmark::new(0.2, 0.3, None));
        assert_eq!(frame.len(), Joint::LeftKnee.index() + 1);
        assert!(frame.is_tracked(Joint::LeftKnee));
        assert!(!frame.is_tracked(Joint::Nose));
    }

    #[test]
    fn test_frame_serde_is_a_plain_array() {
        let frame = LandmarkFrame::new(vec![
            Landmark::new(0.25, 0.5, Some(0.75)),
            Landmark::new(0.5, 0.25, None),
        ]);
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.starts_with('['));

        let parsed: LandmarkFrame =
            serde_json::from_str(r#"[{"x":0.25,"y":0.5,"visibility":0.75},{"x":0.5,"y":0.25}]"#)
                .unwrap();
        assert_eq!(parsed, frame);
    }
}
