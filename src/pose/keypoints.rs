//! Keypoint definitions and per-frame snapshots
//!
//! Joint names follow the 17-point COCO layout produced by MoveNet-style
//! pose estimators. Coordinates are in image space: Y grows downward.

use serde::{Deserialize, Serialize};

/// Body joints reported by the pose estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointName {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl JointName {
    /// Wire name of the joint (`left_hip`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            JointName::Nose => "nose",
            JointName::LeftEye => "left_eye",
            JointName::RightEye => "right_eye",
            JointName::LeftEar => "left_ear",
            JointName::RightEar => "right_ear",
            JointName::LeftShoulder => "left_shoulder",
            JointName::RightShoulder => "right_shoulder",
            JointName::LeftElbow => "left_elbow",
            JointName::RightElbow => "right_elbow",
            JointName::LeftWrist => "left_wrist",
            JointName::RightWrist => "right_wrist",
            JointName::LeftHip => "left_hip",
            JointName::RightHip => "right_hip",
            JointName::LeftKnee => "left_knee",
            JointName::RightKnee => "right_knee",
            JointName::LeftAnkle => "left_ankle",
            JointName::RightAnkle => "right_ankle",
        }
    }
}

impl std::fmt::Display for JointName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full-body outline drawn by renderers, as pairs of joints
pub const SKELETON_CONNECTIONS: [(JointName, JointName); 12] = [
    // Upper body
    (JointName::LeftShoulder, JointName::RightShoulder),
    (JointName::LeftShoulder, JointName::LeftHip),
    (JointName::RightShoulder, JointName::RightHip),
    (JointName::LeftShoulder, JointName::LeftElbow),
    (JointName::RightShoulder, JointName::RightElbow),
    (JointName::LeftElbow, JointName::LeftWrist),
    (JointName::RightElbow, JointName::RightWrist),
    // Lower body
    (JointName::LeftHip, JointName::RightHip),
    (JointName::LeftHip, JointName::LeftKnee),
    (JointName::RightHip, JointName::RightKnee),
    (JointName::LeftKnee, JointName::LeftAnkle),
    (JointName::RightKnee, JointName::RightAnkle),
];

/// A single detected landmark
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: JointName,
    pub x: f32,
    pub y: f32,
    /// Detection confidence in [0, 1]
    #[serde(alias = "score")]
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(name: JointName, x: f32, y: f32, confidence: f32) -> Self {
        Self {
            name,
            x,
            y,
            confidence,
        }
    }
}

/// A skeleton line between two confidently detected joints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from: JointName,
    pub to: JointName,
    pub start: (f32, f32),
    pub end: (f32, f32),
}

/// All keypoints detected in one video frame
///
/// An empty snapshot means the estimator found no pose.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameSnapshot {
    keypoints: Vec<Keypoint>,
}

impl FrameSnapshot {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    /// Snapshot for a frame in which no pose was detected
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    /// First keypoint with the given name, if the estimator reported one
    pub fn get(&self, name: JointName) -> Option<&Keypoint> {
        self.keypoints.iter().find(|k| k.name == name)
    }

    /// Skeleton segments whose endpoints both exceed `min_confidence`
    pub fn visible_segments(&self, min_confidence: f32) -> Vec<Segment> {
        SKELETON_CONNECTIONS
            .iter()
            .filter_map(|&(from, to)| {
                let a = self.get(from).filter(|k| k.confidence > min_confidence)?;
                let b = self.get(to).filter(|k| k.confidence > min_confidence)?;
                Some(Segment {
                    from,
                    to,
                    start: (a.x, a.y),
                    end: (b.x, b.y),
                })
            })
            .collect()
    }
}
