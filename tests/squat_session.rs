//! End-to-end and property tests for the squat session pipeline.

use proptest::prelude::*;

use squat_counter::pose::REQUIRED_JOINTS;
use squat_counter::state::Transition;
use squat_counter::{
    Cue, FeedbackEvent, FrameSnapshot, JointName, Keypoint, ManualClock, Phase, SquatSession, Tuning,
};

const FRAME_MS: u64 = 33;

fn body(hip: f32, knee: f32, ankle: f32) -> FrameSnapshot {
    FrameSnapshot::new(
        REQUIRED_JOINTS
            .iter()
            .map(|&joint| {
                let y = match joint {
                    JointName::LeftHip | JointName::RightHip => hip,
                    JointName::LeftKnee | JointName::RightKnee => knee,
                    JointName::LeftAnkle | JointName::RightAnkle => ankle,
                    _ => hip - 150.0,
                };
                Keypoint::new(joint, 320.0, y, 0.9)
            })
            .collect(),
    )
}

fn standing() -> FrameSnapshot {
    body(100.0, 200.0, 300.0)
}

fn squatting() -> FrameSnapshot {
    body(260.0, 200.0, 300.0)
}

fn without(snapshot: &FrameSnapshot, joint: JointName) -> FrameSnapshot {
    FrameSnapshot::new(
        snapshot
            .keypoints()
            .iter()
            .copied()
            .filter(|k| k.name != joint)
            .collect(),
    )
}

fn create_session() -> (SquatSession<ManualClock>, ManualClock) {
    let clock = ManualClock::new(0);
    (SquatSession::with_clock(Tuning::default(), clock.clone()), clock)
}

/// Feed frames at a steady rate, collecting the transitions taken
fn run(session: &mut SquatSession<ManualClock>, clock: &ManualClock, frames: &[FrameSnapshot]) -> Vec<Transition> {
    frames
        .iter()
        .filter_map(|frame| {
            clock.advance(FRAME_MS);
            session.process(frame).transition
        })
        .collect()
}

fn repeat(frame: FrameSnapshot, n: usize) -> Vec<FrameSnapshot> {
    vec![frame; n]
}

#[test]
fn test_single_rep_cycle() {
    let (mut session, clock) = create_session();
    let frames: Vec<_> = repeat(standing(), 5)
        .into_iter()
        .chain(repeat(squatting(), 5))
        .chain(repeat(standing(), 5))
        .collect();

    let transitions = run(&mut session, &clock, &frames);
    let phases: Vec<_> = transitions.iter().map(|t| (t.from, t.to)).collect();

    assert_eq!(
        phases,
        vec![
            (Phase::Standing, Phase::GoingDown),
            (Phase::GoingDown, Phase::Squatting),
            (Phase::Squatting, Phase::Standing),
        ]
    );
    assert_eq!(session.rep_count(), 1);
    assert_eq!(session.phase(), Phase::Standing);
}

#[test]
fn test_rep_through_going_up() {
    let (mut session, clock) = create_session();
    // Hips level with the knees: neither squatting nor standing
    let halfway = body(200.0, 200.0, 300.0);
    let frames: Vec<_> = repeat(standing(), 5)
        .into_iter()
        .chain(repeat(squatting(), 5))
        .chain(repeat(halfway, 5))
        .chain(repeat(standing(), 5))
        .collect();

    let transitions = run(&mut session, &clock, &frames);
    let phases: Vec<_> = transitions.iter().map(|t| t.to).collect();

    assert_eq!(
        phases,
        vec![Phase::GoingDown, Phase::Squatting, Phase::GoingUp, Phase::Standing]
    );
    assert_eq!(session.rep_count(), 1);
}

#[test]
fn test_alternating_frames_never_count() {
    let (mut session, clock) = create_session();
    let frames: Vec<_> = (0..60)
        .map(|i| if i % 2 == 0 { squatting() } else { standing() })
        .collect();

    let transitions = run(&mut session, &clock, &frames);
    assert!(transitions.is_empty());
    assert_eq!(session.rep_count(), 0);

    // Once movement stops the session is ready for a normal rep
    run(&mut session, &clock, &repeat(standing(), 5));
    assert_eq!(session.phase(), Phase::Standing);
    assert!(session.stable_frames() >= 3);
}

#[test]
fn test_step_back_preserves_count() {
    let (mut session, clock) = create_session();
    let frames: Vec<_> = repeat(standing(), 5)
        .into_iter()
        .chain(repeat(squatting(), 5))
        .chain(repeat(standing(), 5))
        .chain(repeat(squatting(), 5))
        .collect();
    run(&mut session, &clock, &frames);
    assert_eq!(session.phase(), Phase::Squatting);

    clock.advance(1000);
    let outcome = session.process(&FrameSnapshot::empty());
    assert_eq!(outcome.phase, Phase::Standing);
    assert_eq!(outcome.rep_count, 1);
    assert!(outcome.feedback.contains(&FeedbackEvent::message(Cue::StepBack)));
}

#[test]
fn test_low_confidence_counts_as_not_visible() {
    let (mut session, _) = create_session();
    let mut keypoints = standing().keypoints().to_vec();
    for k in keypoints.iter_mut().filter(|k| k.name == JointName::RightShoulder) {
        k.confidence = 0.15;
    }
    let outcome = session.process(&FrameSnapshot::new(keypoints));
    assert_eq!(outcome.feedback, vec![FeedbackEvent::message(Cue::StepBack)]);
}

#[test]
fn test_messages_debounced_on_simulated_clock() {
    let (mut session, clock) = create_session();
    let first = session.process(&standing());
    assert_eq!(first.feedback, vec![FeedbackEvent::message(Cue::TrySquat)]);

    clock.advance(100);
    assert!(session.process(&standing()).feedback.is_empty());

    clock.advance(401);
    assert_eq!(
        session.process(&standing()).feedback,
        vec![FeedbackEvent::message(Cue::TrySquat)]
    );
}

#[test]
fn test_skeleton_returned_for_visible_subject() {
    let (mut session, _) = create_session();
    let outcome = session.process(&standing());
    // Arms are absent; shoulders, hips and legs give 8 segments
    assert_eq!(outcome.skeleton.len(), 8);

    let outcome = session.process(&without(&standing(), JointName::LeftAnkle));
    assert!(outcome.skeleton.is_empty());
}

/// Runs of identical frames, with occasional frames where the subject is lost
fn frame_sequence() -> impl Strategy<Value = Vec<Option<(u16, u16, u16)>>> {
    let run = prop_oneof![
        8 => (50u16..350, 150u16..250, 280u16..320, 1usize..8)
            .prop_map(|(hip, knee, ankle, n)| vec![Some((hip, knee, ankle)); n]),
        1 => (1usize..3).prop_map(|n| vec![None::<(u16, u16, u16)>; n]),
    ];
    prop::collection::vec(run, 1..40).prop_map(|runs| runs.into_iter().flatten().collect())
}

/// Hips sit half a unit off the integer grid so no posture or stability
/// comparison lands exactly on its threshold, at any scale
fn to_frame(heights: Option<(u16, u16, u16)>, scale: f32) -> FrameSnapshot {
    match heights {
        Some((hip, knee, ankle)) => body(
            (hip as f32 + 0.5) * scale,
            knee as f32 * scale,
            ankle as f32 * scale,
        ),
        None => without(&standing(), JointName::RightHip),
    }
}

proptest! {
    #[test]
    fn prop_rep_count_never_decreases(frames in frame_sequence()) {
        let (mut session, clock) = create_session();
        let mut last = 0;
        for heights in frames {
            clock.advance(FRAME_MS);
            let outcome = session.process(&to_frame(heights, 1.0));
            prop_assert!(outcome.rep_count >= last);
            last = outcome.rep_count;
        }
    }

    #[test]
    fn prop_visibility_loss_resets_transient_state(frames in frame_sequence(), missing in 0usize..8) {
        let (mut session, clock) = create_session();
        for heights in frames {
            clock.advance(FRAME_MS);
            session.process(&to_frame(heights, 1.0));
        }
        let count = session.rep_count();

        clock.advance(FRAME_MS);
        let outcome = session.process(&without(&standing(), REQUIRED_JOINTS[missing]));
        prop_assert_eq!(outcome.phase, Phase::Standing);
        prop_assert_eq!(outcome.rep_count, count);
        prop_assert_eq!(session.stable_frames(), 0);
        prop_assert!(!session.has_announced_phase());
    }

    #[test]
    fn prop_transitions_are_settle_gated(frames in frame_sequence()) {
        let (mut session, clock) = create_session();
        for heights in frames {
            clock.advance(FRAME_MS);
            let outcome = session.process(&to_frame(heights, 1.0));
            if let Some(t) = outcome.transition {
                let ungated = t.from == Phase::Squatting && t.to == Phase::GoingUp;
                prop_assert!(ungated || session.stable_frames() >= 3, "{:?} without settling", t);
            }
        }
    }

    #[test]
    fn prop_phases_are_scale_invariant(
        frames in frame_sequence(),
        scale in prop_oneof![Just(0.5f32), Just(1.7f32), Just(2.0f32), Just(3.0f32), Just(4.0f32)],
    ) {
        let (mut base, base_clock) = create_session();
        let (mut scaled, scaled_clock) = create_session();
        for heights in frames {
            base_clock.advance(FRAME_MS);
            scaled_clock.advance(FRAME_MS);
            let a = base.process(&to_frame(heights, 1.0));
            let b = scaled.process(&to_frame(heights, scale));
            prop_assert_eq!(a.phase, b.phase);
            prop_assert_eq!(a.transition, b.transition);
            prop_assert_eq!(a.rep_count, b.rep_count);
        }
    }
}
