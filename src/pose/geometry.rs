//! Scalar body measurements derived from a validated snapshot

use serde::{Deserialize, Serialize};

use super::keypoints::{FrameSnapshot, JointName};

/// Geometry could not be derived from a snapshot
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("missing geometry input: {0}")]
    MissingGeometryInput(JointName),
}

/// Averaged vertical joint positions for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometrySummary {
    pub hip_y: f32,
    pub knee_y: f32,
    pub ankle_y: f32,
    /// Vertical hip-to-ankle distance, never negative
    pub leg_length: f32,
}

/// Where the hips sit relative to the knees
///
/// Both flags false means the subject is in the transition band between
/// the two positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posture {
    pub in_squat: bool,
    pub fully_standing: bool,
}

impl GeometrySummary {
    /// Average left/right hip, knee and ankle heights
    pub fn from_snapshot(snapshot: &FrameSnapshot) -> Result<Self, GeometryError> {
        let hip_y = mean_y(snapshot, JointName::LeftHip, JointName::RightHip)?;
        let knee_y = mean_y(snapshot, JointName::LeftKnee, JointName::RightKnee)?;
        let ankle_y = mean_y(snapshot, JointName::LeftAnkle, JointName::RightAnkle)?;
        Ok(Self::from_heights(hip_y, knee_y, ankle_y))
    }

    pub fn from_heights(hip_y: f32, knee_y: f32, ankle_y: f32) -> Self {
        Self {
            hip_y,
            knee_y,
            ankle_y,
            leg_length: (hip_y - ankle_y).abs(),
        }
    }

    /// Hips below the knees by more than `depth` leg lengths
    pub fn is_in_squat(&self, depth: f32) -> bool {
        self.hip_y > self.knee_y + self.leg_length * depth
    }

    /// Hips above the knees by more than `margin` leg lengths
    pub fn is_fully_standing(&self, margin: f32) -> bool {
        self.hip_y < self.knee_y - self.leg_length * margin
    }

    pub fn posture(&self, depth: f32, margin: f32) -> Posture {
        Posture {
            in_squat: self.is_in_squat(depth),
            fully_standing: self.is_fully_standing(margin),
        }
    }
}

fn mean_y(snapshot: &FrameSnapshot, left: JointName, right: JointName) -> Result<f32, GeometryError> {
    let l = snapshot
        .get(left)
        .ok_or(GeometryError::MissingGeometryInput(left))?;
    let r = snapshot
        .get(right)
        .ok_or(GeometryError::MissingGeometryInput(right))?;
    Ok((l.y + r.y) / 2.0)
}
