//! squat-counter: squat repetition counting from pose keypoints
//!
//! Consumes one set of named 2D keypoints per video frame (from an external
//! pose estimator) and turns them into a rep count, a squat phase and
//! debounced feedback events for presentation collaborators.
//!
//! Frame pipeline:
//! - Keypoint filter: required joints must be confidently visible
//! - Pose geometry: averaged hip/knee/ankle heights and leg length
//! - Stability tracker: consecutive low-movement frames
//! - State machine: Standing, GoingDown, Squatting, GoingUp
//! - Feedback emitter: message debounce and the celebration overlay
//!
//! [`session::SquatSession`] drives the pipeline for one subject. The
//! `squat-counter` binary serves a session over a Unix socket.

pub mod clock;
pub mod config;
pub mod events;
pub mod ipc;
pub mod lifecycle;
pub mod pose;
pub mod service;
pub mod session;
pub mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, Tuning};
pub use events::{Cue, FeedbackEvent, SessionEvent, Tone};
pub use pose::{FrameSnapshot, JointName, Keypoint};
pub use session::{FrameOutcome, SessionSnapshot, SquatSession};
pub use state::Phase;
