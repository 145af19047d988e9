//! Frame-to-frame hip stability tracking
//!
//! A frame is stable when the hips moved less than a fraction of the leg
//! length since the immediately preceding frame. Position classifications
//! are only trusted once several stable frames have accumulated.

/// Counts consecutive low-movement frames
#[derive(Debug, Clone)]
pub struct StabilityTracker {
    /// Hip height seen on the previous frame
    last_hip_y: f32,
    consecutive_stable_frames: u32,
    /// Allowed movement as a fraction of leg length
    threshold: f32,
    /// Stable frames needed before the position counts as settled
    required_frames: u32,
}

impl StabilityTracker {
    pub fn new(threshold: f32, required_frames: u32) -> Self {
        Self {
            last_hip_y: 0.0,
            consecutive_stable_frames: 0,
            threshold,
            required_frames,
        }
    }

    /// Record a frame and return whether it was stable
    pub fn update(&mut self, hip_y: f32, leg_length: f32) -> bool {
        // Multiplied out so a zero leg length is never stable.
        let stable = (hip_y - self.last_hip_y).abs() < leg_length * self.threshold;
        self.last_hip_y = hip_y;

        if stable {
            self.consecutive_stable_frames = self.consecutive_stable_frames.saturating_add(1);
        } else {
            self.consecutive_stable_frames = 0;
        }
        stable
    }

    pub fn has_settled(&self) -> bool {
        self.consecutive_stable_frames >= self.required_frames
    }

    pub fn stable_frames(&self) -> u32 {
        self.consecutive_stable_frames
    }

    pub fn last_hip_y(&self) -> f32 {
        self.last_hip_y
    }

    /// Drop the accumulated streak; the last hip height is kept
    pub fn reset(&mut self) {
        self.consecutive_stable_frames = 0;
    }
}
