//! Events module for user feedback
//!
//! Provides the cues the session asks to show, the feedback events handed
//! to presentation collaborators, and the session events pushed to
//! subscribed IPC clients.

mod emitter;

pub use emitter::FeedbackEmitter;

use serde::{Deserialize, Serialize};

/// Text shown while the celebratory overlay is active
pub const OVERLAY_TEXT: &str = "GOOD!";

/// Presentation category of a feedback message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Guidance unrelated to form (framing, positioning)
    Info,
    /// Progress and encouragement
    Positive,
    /// Correction or a reminder to finish the movement
    Caution,
}

impl Tone {
    /// Suggested display color
    pub fn color(&self) -> &'static str {
        match self {
            Tone::Info => "#2196F3",
            Tone::Positive => "#4CAF50",
            Tone::Caution => "#FF9800",
        }
    }
}

/// Feedback the session can request during a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// Required joints are not all in view
    StepBack,
    /// Subject is visible but starts out crouched
    StandUpStraight,
    /// Subject is visible and standing, ready for a first rep
    TrySquat,
    /// Descent detected
    GoingDown,
    /// Bottom of the squat reached
    Hold,
    /// Stood back up without reaching depth
    TryLower,
    /// Rising out of the squat
    KeepGoingUp,
    /// Dropped back into the squat while rising
    FinishRising,
    /// Full rep counted
    RepCompleted,
}

impl Cue {
    pub fn text(&self) -> &'static str {
        match self {
            Cue::StepBack => "Please step back so your full body is visible",
            Cue::StandUpStraight => "Stand up straight to begin",
            Cue::TrySquat => "Great! Now try doing a squat",
            Cue::GoingDown => "Good! Going down...",
            Cue::Hold => "Hold... Now stand up!",
            Cue::TryLower => "Try going lower!",
            Cue::KeepGoingUp => "Good! Keep going up!",
            Cue::FinishRising => "Keep going up!",
            Cue::RepCompleted => "Great job! Squat completed.",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Cue::StepBack => Tone::Info,
            Cue::Hold | Cue::TryLower | Cue::FinishRising => Tone::Caution,
            Cue::StandUpStraight
            | Cue::TrySquat
            | Cue::GoingDown
            | Cue::KeepGoingUp
            | Cue::RepCompleted => Tone::Positive,
        }
    }
}

/// Feedback handed to presentation collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedbackEvent {
    /// Replace the on-screen message
    Message {
        cue: Cue,
        text: String,
        tone: Tone,
        /// Display color for `tone`
        color: String,
    },
    /// Play the short cue sound
    Sound,
    /// Show the full-screen celebration overlay
    OverlayShown { text: String },
    /// Hide the celebration overlay
    OverlayCleared,
}

impl FeedbackEvent {
    pub fn message(cue: Cue) -> Self {
        let tone = cue.tone();
        FeedbackEvent::Message {
            cue,
            text: cue.text().to_string(),
            tone,
            color: tone.color().to_string(),
        }
    }
}

impl std::fmt::Display for FeedbackEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedbackEvent::Message { text, .. } => write!(f, "MESSAGE ({})", text),
            FeedbackEvent::Sound => write!(f, "SOUND"),
            FeedbackEvent::OverlayShown { text } => write!(f, "OVERLAY_SHOWN ({})", text),
            FeedbackEvent::OverlayCleared => write!(f, "OVERLAY_CLEARED"),
        }
    }
}

/// Events pushed to subscribed clients by the session worker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Feedback emitted while processing a frame
    Feedback { event: FeedbackEvent },
    /// A rep was counted
    RepCompleted { rep_count: u32 },
    /// The session was explicitly reset
    SessionReset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_carries_cue_text_and_tone() {
        let event = FeedbackEvent::message(Cue::TryLower);
        assert_eq!(
            event,
            FeedbackEvent::Message {
                cue: Cue::TryLower,
                text: "Try going lower!".to_string(),
                tone: Tone::Caution,
                color: "#FF9800".to_string(),
            }
        );
        assert_eq!(event.to_string(), "MESSAGE (Try going lower!)");
    }

    #[test]
    fn test_event_serialization() {
        let event = SessionEvent::RepCompleted { rep_count: 3 };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("rep_completed"));
        assert!(json.contains("3"));
    }

    #[test]
    fn test_feedback_deserialization() {
        let json = r#"{"type":"feedback","event":{"type":"sound"}}"#;
        let event: SessionEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(
            event,
            SessionEvent::Feedback {
                event: FeedbackEvent::Sound
            }
        ));
    }

    #[test]
    fn test_step_back_is_informational() {
        assert_eq!(Cue::StepBack.tone(), Tone::Info);
        assert_eq!(Cue::StepBack.tone().color(), "#2196F3");
    }
}
