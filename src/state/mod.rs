//! State machine module for squat tracking
//!
//! Provides an explicit state machine with four phases:
//! - Standing: Upright, waiting for a descent
//! - GoingDown: Descent detected
//! - Squatting: Holding at depth
//! - GoingUp: Rising, rep counted once fully upright
//!
//! and the stability tracker that gates its transitions.

mod machine;
mod stability;

pub use machine::{next_phase, Phase, SquatStateMachine, Transition};
pub use stability::StabilityTracker;
