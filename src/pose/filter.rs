//! Visibility gate for the joints squat tracking depends on

use super::keypoints::{FrameSnapshot, JointName};

/// Joints that must all be confidently detected before a frame is analyzed
pub const REQUIRED_JOINTS: [JointName; 8] = [
    JointName::LeftHip,
    JointName::RightHip,
    JointName::LeftKnee,
    JointName::RightKnee,
    JointName::LeftShoulder,
    JointName::RightShoulder,
    JointName::LeftAnkle,
    JointName::RightAnkle,
];

/// Checks that every required joint is present above a confidence floor
#[derive(Debug, Clone, Copy)]
pub struct KeypointFilter {
    min_confidence: f32,
}

impl KeypointFilter {
    pub fn new(min_confidence: f32) -> Self {
        Self { min_confidence }
    }

    /// True iff each required joint exists with confidence strictly above the floor
    pub fn is_visible(&self, snapshot: &FrameSnapshot) -> bool {
        REQUIRED_JOINTS
            .iter()
            .all(|&joint| self.is_confident(snapshot, joint))
    }

    /// Required joints that are absent or below the floor
    pub fn missing(&self, snapshot: &FrameSnapshot) -> Vec<JointName> {
        REQUIRED_JOINTS
            .iter()
            .copied()
            .filter(|&joint| !self.is_confident(snapshot, joint))
            .collect()
    }

    fn is_confident(&self, snapshot: &FrameSnapshot, joint: JointName) -> bool {
        snapshot
            .get(joint)
            .map_or(false, |k| k.confidence > self.min_confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Keypoint;

    fn full_body(confidence: f32) -> Vec<Keypoint> {
        REQUIRED_JOINTS
            .iter()
            .map(|&joint| Keypoint::new(joint, 0.0, 0.0, confidence))
            .collect()
    }

    #[test]
    fn test_all_required_visible() {
        let filter = KeypointFilter::new(0.2);
        let snapshot = FrameSnapshot::new(full_body(0.9));
        assert!(filter.is_visible(&snapshot));
        assert!(filter.missing(&snapshot).is_empty());
    }

    #[test]
    fn test_confidence_floor_is_strict() {
        let filter = KeypointFilter::new(0.2);
        let snapshot = FrameSnapshot::new(full_body(0.2));
        assert!(!filter.is_visible(&snapshot));
    }

    #[test]
    fn test_missing_joint_reported() {
        let filter = KeypointFilter::new(0.2);
        let mut keypoints = full_body(0.9);
        keypoints.retain(|k| k.name != JointName::LeftAnkle);
        let snapshot = FrameSnapshot::new(keypoints);

        assert!(!filter.is_visible(&snapshot));
        assert_eq!(filter.missing(&snapshot), vec![JointName::LeftAnkle]);
    }

    #[test]
    fn test_empty_snapshot_not_visible() {
        let filter = KeypointFilter::new(0.2);
        assert!(!filter.is_visible(&FrameSnapshot::empty()));
        assert_eq!(filter.missing(&FrameSnapshot::empty()).len(), REQUIRED_JOINTS.len());
    }
}
