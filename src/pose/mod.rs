//! Pose input module
//!
//! Turns raw keypoints from an external estimator into the measurements
//! the squat state machine works with:
//! - keypoints: joint names, snapshots and skeleton topology
//! - filter: the required-joint visibility gate
//! - geometry: averaged joint heights and position predicates

mod filter;
mod geometry;
mod keypoints;

pub use filter::{KeypointFilter, REQUIRED_JOINTS};
pub use geometry::{GeometryError, GeometrySummary, Posture};
pub use keypoints::{FrameSnapshot, JointName, Keypoint, Segment, SKELETON_CONNECTIONS};
