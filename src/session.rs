//! Per-frame squat tracking pipeline
//!
//! A [`SquatSession`] owns all state that persists between frames and runs
//! each snapshot through the visibility gate, geometry, stability tracking,
//! the state machine and feedback debouncing. Processing a frame is atomic
//! with respect to that state: a frame either fully applies or, when its
//! geometry can't be derived, leaves the state untouched.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::Tuning;
use crate::events::{Cue, FeedbackEmitter, FeedbackEvent};
use crate::pose::{FrameSnapshot, GeometrySummary, KeypointFilter, Segment};
use crate::state::{Phase, SquatStateMachine, StabilityTracker, Transition};

/// Result of processing one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameOutcome {
    pub rep_count: u32,
    pub phase: Phase,
    /// Phase change taken on this frame, if any
    pub transition: Option<Transition>,
    /// True when this frame completed a rep
    pub rep_completed: bool,
    /// Feedback to present, in order
    pub feedback: Vec<FeedbackEvent>,
    /// Skeleton lines to draw; empty when the subject isn't fully visible
    pub skeleton: Vec<Segment>,
}

/// Point-in-time view of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub rep_count: u32,
    pub phase: Phase,
    pub stable_frames: u32,
    pub has_announced_phase: bool,
    pub frames_processed: u64,
}

/// One subject's squat tracking state
pub struct SquatSession<C = SystemClock> {
    tuning: Tuning,
    filter: KeypointFilter,
    stability: StabilityTracker,
    machine: SquatStateMachine,
    emitter: FeedbackEmitter<C>,
    frames_processed: u64,
}

impl SquatSession<SystemClock> {
    /// Create a session timed by the system clock
    pub fn new(tuning: Tuning) -> Self {
        Self::with_clock(tuning, SystemClock::new())
    }
}

impl<C: Clock> SquatSession<C> {
    /// Create a session timed by `clock`
    pub fn with_clock(tuning: Tuning, clock: C) -> Self {
        Self {
            tuning,
            filter: KeypointFilter::new(tuning.min_confidence),
            stability: StabilityTracker::new(tuning.stability_threshold, tuning.stable_frames),
            machine: SquatStateMachine::new(),
            emitter: FeedbackEmitter::new(clock, tuning.debounce_ms, tuning.overlay_ms),
            frames_processed: 0,
        }
    }

    /// Process one frame of keypoints
    pub fn process(&mut self, snapshot: &FrameSnapshot) -> FrameOutcome {
        let mut feedback: Vec<FeedbackEvent> = self.emitter.poll_overlay().into_iter().collect();

        if !self.filter.is_visible(snapshot) {
            self.lose_subject(snapshot, &mut feedback);
            self.frames_processed += 1;
            return self.outcome(None, feedback, Vec::new());
        }

        let geometry = match GeometrySummary::from_snapshot(snapshot) {
            Ok(geometry) => geometry,
            Err(e) => {
                warn!(%e, "skipping frame");
                return self.outcome(None, feedback, Vec::new());
            }
        };
        let posture = geometry.posture(self.tuning.squat_depth_threshold, self.tuning.standing_threshold);

        // Onboarding prompt until the first descent of a rep is announced.
        // A transition cue on the same frame then falls in its debounce window.
        if self.machine.phase() == Phase::Standing && !self.machine.has_announced_phase() {
            let prompt = if posture.in_squat {
                Cue::StandUpStraight
            } else {
                Cue::TrySquat
            };
            feedback.extend(self.emitter.message(prompt));
        }

        let stable = self.stability.update(geometry.hip_y, geometry.leg_length);
        let settled = self.stability.has_settled();

        debug!(
            phase = %self.machine.phase(),
            stable,
            stable_frames = self.stability.stable_frames(),
            in_squat = posture.in_squat,
            standing = posture.fully_standing,
            "frame classified"
        );

        let transition = self.machine.advance(posture, settled);
        if let Some(t) = transition {
            feedback.extend(self.emitter.message(t.cue()));
            if t.plays_sound() {
                feedback.push(FeedbackEvent::Sound);
            }
            if t.completes_rep() {
                feedback.extend(self.emitter.trigger_overlay());
            }
        }

        self.frames_processed += 1;
        let skeleton = snapshot.visible_segments(self.tuning.render_confidence);
        self.outcome(transition, feedback, skeleton)
    }

    /// Advance time without a frame, clearing an expired overlay
    pub fn tick(&mut self) -> Vec<FeedbackEvent> {
        self.emitter.poll_overlay().into_iter().collect()
    }

    /// Zero the count and all transient state
    pub fn reset(&mut self) {
        info!(rep_count = self.machine.rep_count(), "session reset");
        self.machine.reset();
        self.stability = StabilityTracker::new(self.tuning.stability_threshold, self.tuning.stable_frames);
        self.emitter.reset();
        self.frames_processed = 0;
    }

    pub fn rep_count(&self) -> u32 {
        self.machine.rep_count()
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn stable_frames(&self) -> u32 {
        self.stability.stable_frames()
    }

    pub fn has_announced_phase(&self) -> bool {
        self.machine.has_announced_phase()
    }

    pub fn overlay_active(&self) -> bool {
        self.emitter.overlay_active()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            rep_count: self.machine.rep_count(),
            phase: self.machine.phase(),
            stable_frames: self.stability.stable_frames(),
            has_announced_phase: self.machine.has_announced_phase(),
            frames_processed: self.frames_processed,
        }
    }

    fn lose_subject(&mut self, snapshot: &FrameSnapshot, feedback: &mut Vec<FeedbackEvent>) {
        if self.machine.phase() != Phase::Standing || self.stability.stable_frames() > 0 {
            debug!(
                missing = ?self.filter.missing(snapshot),
                phase = %self.machine.phase(),
                "subject lost, resetting phase"
            );
        }
        self.machine.lose_subject();
        self.stability.reset();
        feedback.extend(self.emitter.clear_overlay());
        feedback.extend(self.emitter.message(Cue::StepBack));
    }

    fn outcome(
        &self,
        transition: Option<Transition>,
        feedback: Vec<FeedbackEvent>,
        skeleton: Vec<Segment>,
    ) -> FrameOutcome {
        FrameOutcome {
            rep_count: self.machine.rep_count(),
            phase: self.machine.phase(),
            transition,
            rep_completed: transition.map_or(false, |t| t.completes_rep()),
            feedback,
            skeleton,
        }
    }
}
