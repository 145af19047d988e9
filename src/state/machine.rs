//! Core squat state machine
//!
//! Moves between Standing, GoingDown, Squatting and GoingUp based on the
//! subject's posture and whether the hips have settled. Every transition
//! is gated on the settle signal except Squatting -> GoingUp, which reacts
//! as soon as the hips leave the squat band. That transition never counts
//! a rep.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::events::Cue;
use crate::pose::Posture;

/// Phase of the squat cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Upright, waiting for a descent
    #[default]
    Standing,
    /// Descent detected, not yet confirmed at depth
    GoingDown,
    /// Holding at depth
    Squatting,
    /// Rising out of the squat
    GoingUp,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Standing => write!(f, "Standing"),
            Phase::GoingDown => write!(f, "GoingDown"),
            Phase::Squatting => write!(f, "Squatting"),
            Phase::GoingUp => write!(f, "GoingUp"),
        }
    }
}

/// A phase change produced by one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
}

impl Transition {
    /// True when this transition finishes a full down-up cycle
    pub fn completes_rep(&self) -> bool {
        self.to == Phase::Standing && matches!(self.from, Phase::Squatting | Phase::GoingUp)
    }

    /// True when this transition starts a rep
    pub fn plays_sound(&self) -> bool {
        self.from == Phase::Standing && self.to == Phase::GoingDown
    }

    /// Feedback to show for this transition
    pub fn cue(&self) -> Cue {
        match (self.from, self.to) {
            (Phase::Standing, _) => Cue::GoingDown,
            (Phase::GoingDown, Phase::Squatting) => Cue::Hold,
            (Phase::GoingDown, _) => Cue::TryLower,
            (Phase::Squatting, Phase::GoingUp) => Cue::KeepGoingUp,
            (Phase::GoingUp, Phase::Squatting) => Cue::FinishRising,
            (Phase::Squatting, _) | (Phase::GoingUp, _) => Cue::RepCompleted,
        }
    }
}

/// Compute the next phase from the current one
///
/// Pure: identical inputs always give the same phase.
pub fn next_phase(phase: Phase, posture: Posture, settled: bool) -> Phase {
    match phase {
        Phase::Standing => compute_from_standing(posture, settled),
        Phase::GoingDown => compute_from_going_down(posture, settled),
        Phase::Squatting => compute_from_squatting(posture, settled),
        Phase::GoingUp => compute_from_going_up(posture, settled),
    }
}

fn compute_from_standing(posture: Posture, settled: bool) -> Phase {
    if posture.in_squat && settled {
        Phase::GoingDown
    } else {
        Phase::Standing
    }
}

fn compute_from_going_down(posture: Posture, settled: bool) -> Phase {
    if posture.in_squat && settled {
        Phase::Squatting
    }
    // Came back up without reaching depth
    else if posture.fully_standing && settled {
        Phase::Standing
    } else {
        Phase::GoingDown
    }
}

fn compute_from_squatting(posture: Posture, settled: bool) -> Phase {
    // Leaving the squat band is not settle-gated
    if !posture.in_squat && !posture.fully_standing {
        Phase::GoingUp
    }
    // Came up fast enough to skip GoingUp
    else if posture.fully_standing && settled {
        Phase::Standing
    } else {
        Phase::Squatting
    }
}

fn compute_from_going_up(posture: Posture, settled: bool) -> Phase {
    if posture.fully_standing && settled {
        Phase::Standing
    } else if posture.in_squat && settled {
        Phase::Squatting
    } else {
        Phase::GoingUp
    }
}

/// Rep count and phase for one session
#[derive(Debug, Clone, Default)]
pub struct SquatStateMachine {
    phase: Phase,
    rep_count: u32,
    /// Set once the descent of the current rep has been announced
    has_announced_phase: bool,
}

impl SquatStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn has_announced_phase(&self) -> bool {
        self.has_announced_phase
    }

    /// Advance by one frame, returning the transition taken if any
    pub fn advance(&mut self, posture: Posture, settled: bool) -> Option<Transition> {
        let old_phase = self.phase;
        let new_phase = next_phase(old_phase, posture, settled);
        if new_phase == old_phase {
            return None;
        }

        let transition = Transition {
            from: old_phase,
            to: new_phase,
        };
        self.phase = new_phase;

        if transition.plays_sound() {
            self.has_announced_phase = true;
        }
        if transition.completes_rep() {
            self.rep_count = self.rep_count.saturating_add(1);
            self.has_announced_phase = false;
        }

        info!(
            from = %old_phase,
            to = %new_phase,
            rep_count = self.rep_count,
            "phase transition"
        );

        Some(transition)
    }

    /// Subject left the frame: restart the cycle, keep the count
    pub fn lose_subject(&mut self) {
        self.phase = Phase::Standing;
        self.has_announced_phase = false;
    }

    /// Start a fresh session
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
