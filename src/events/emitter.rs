//! Rate limiting for feedback events
//!
//! Messages are debounced so the display doesn't flicker between texts on
//! consecutive frames. Dropped messages are not queued. Sound cues are
//! never debounced. The celebration overlay has a single active window
//! whose end is fixed by the trigger that opened it.

use tracing::debug;

use crate::clock::Clock;

use super::{Cue, FeedbackEvent, OVERLAY_TEXT};

/// Debounces messages and tracks the overlay window
#[derive(Debug)]
pub struct FeedbackEmitter<C> {
    clock: C,
    debounce_ms: u64,
    overlay_ms: u64,
    /// When the last message went out
    last_message_at: Option<u64>,
    /// When the active overlay should clear
    overlay_deadline: Option<u64>,
}

impl<C: Clock> FeedbackEmitter<C> {
    pub fn new(clock: C, debounce_ms: u64, overlay_ms: u64) -> Self {
        Self {
            clock,
            debounce_ms,
            overlay_ms,
            last_message_at: None,
            overlay_deadline: None,
        }
    }

    /// Emit a message unless one went out within the debounce window
    pub fn message(&mut self, cue: Cue) -> Option<FeedbackEvent> {
        let now = self.clock.now_ms();
        if let Some(last) = self.last_message_at {
            if now.saturating_sub(last) <= self.debounce_ms {
                debug!(?cue, since_last_ms = now.saturating_sub(last), "message debounced");
                return None;
            }
        }

        self.last_message_at = Some(now);
        let event = FeedbackEvent::message(cue);
        debug!(%event, "emitting feedback");
        Some(event)
    }

    /// Open the overlay window; a trigger while it is open is a no-op
    pub fn trigger_overlay(&mut self) -> Option<FeedbackEvent> {
        if self.overlay_active() {
            return None;
        }
        self.overlay_deadline = Some(self.clock.now_ms().saturating_add(self.overlay_ms));
        Some(FeedbackEvent::OverlayShown {
            text: OVERLAY_TEXT.to_string(),
        })
    }

    /// Close the overlay immediately if it is open
    pub fn clear_overlay(&mut self) -> Option<FeedbackEvent> {
        self.overlay_deadline
            .take()
            .map(|_| FeedbackEvent::OverlayCleared)
    }

    /// Close the overlay if its window has elapsed
    pub fn poll_overlay(&mut self) -> Option<FeedbackEvent> {
        match self.overlay_deadline {
            Some(deadline) if self.clock.now_ms() >= deadline => self.clear_overlay(),
            _ => None,
        }
    }

    pub fn overlay_active(&self) -> bool {
        self.overlay_deadline.is_some()
    }

    pub fn overlay_deadline(&self) -> Option<u64> {
        self.overlay_deadline
    }

    /// Forget debounce and overlay state
    pub fn reset(&mut self) {
        self.last_message_at = None;
        self.overlay_deadline = None;
    }
}
