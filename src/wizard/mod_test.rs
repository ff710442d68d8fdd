use super::*;
use std::time::Duration;

use crate::steps::image::IMAGE_MIME;
use crate::steps::voice::AUDIO_MIME;

fn outcome(kind: StepKind) -> StepOutcome {
    match kind {
        StepKind::Location => {
            StepOutcome::Location(LocationRecord { lat: 28.61, lng: 77.20, address: "New Delhi, India".into() })
        }
        StepKind::Questionnaire => StepOutcome::Questionnaire(QuestionnaireAnswer { needs_emergency_help: true }),
        StepKind::VoiceVerification => {
            StepOutcome::Voice(AudioClip { data: vec![1, 2], mime: AUDIO_MIME, duration_secs: 2 })
        }
        StepKind::ImageVerification => {
            StepOutcome::Image(ImageCapture { data: vec![0xFF, 0xD8], mime: IMAGE_MIME, width: 1, height: 1 })
        }
        StepKind::HelplineConnection => StepOutcome::Helpline(HelplineConnected { after: Duration::from_secs(3) }),
    }
}

// =============================================================================
// StepKind
// =============================================================================

#[test]
fn steps_are_ordered_and_titled() {
    let titles: Vec<_> = StepKind::ALL.iter().map(|k| k.title()).collect();
    assert_eq!(
        titles,
        vec![
            "Location Selection",
            "Emergency Verification",
            "Voice Recording",
            "Image Verification",
            "Helpline Connection",
        ]
    );
    for (i, kind) in StepKind::ALL.iter().enumerate() {
        assert_eq!(kind.index(), i);
        assert_eq!(StepKind::from_index(i), Some(*kind));
    }
    assert_eq!(StepKind::from_index(STEP_COUNT), None);
    assert_eq!(StepKind::LAST.index(), STEP_COUNT - 1);
}

// =============================================================================
// Sequencer
// =============================================================================

#[test]
fn starts_at_location() {
    let seq = Sequencer::new();
    assert_eq!(seq.index(), 0);
    assert_eq!(seq.current(), StepKind::Location);
    assert!(!seq.is_settled());
}

#[test]
fn advancing_walks_every_step_then_stays_at_last() {
    let mut seq = Sequencer::new();
    for (i, kind) in StepKind::ALL.iter().take(STEP_COUNT - 1).enumerate() {
        let t = seq.advance(&outcome(*kind)).unwrap();
        assert_eq!(t.from, *kind);
        assert_eq!(seq.index(), i + 1);
    }
    assert_eq!(seq.current(), StepKind::HelplineConnection);
    assert!(!seq.is_settled());

    let t = seq.advance(&outcome(StepKind::HelplineConnection)).unwrap();
    assert!(!t.moved());
    assert_eq!(seq.index(), STEP_COUNT - 1);
    assert!(seq.is_settled());
    assert_eq!(seq.disposition(StepKind::HelplineConnection), Disposition::Completed);
}

#[test]
fn outcome_from_other_step_is_rejected() {
    let mut seq = Sequencer::new();
    let err = seq.advance(&outcome(StepKind::VoiceVerification)).unwrap_err();

    assert!(matches!(
        err,
        SequenceError::OutcomeMismatch { current: StepKind::Location, outcome: StepKind::VoiceVerification }
    ));
    assert_eq!(seq.index(), 0);
    assert_eq!(seq.disposition(StepKind::Location), Disposition::Pending);
    assert_eq!(err.error_code(), "E_SEQUENCE_OUTCOME_MISMATCH");
}

#[test]
fn skip_records_skipped_and_moves_on() {
    let mut seq = Sequencer::new();
    let t = seq.skip();

    assert_eq!(t, Transition { from: StepKind::Location, to: StepKind::Questionnaire });
    assert_eq!(seq.disposition(StepKind::Location), Disposition::Skipped);
}

#[test]
fn cursor_never_decreases_or_overflows() {
    let mut seq = Sequencer::new();
    let mut last = seq.index();
    for _ in 0..12 {
        seq.skip();
        assert!(seq.index() >= last);
        assert!(seq.index() < STEP_COUNT);
        last = seq.index();
    }
    assert_eq!(seq.index(), STEP_COUNT - 1);
}

#[test]
fn first_settlement_of_last_step_sticks() {
    let mut seq = Sequencer::new();
    for _ in 0..STEP_COUNT - 1 {
        seq.skip();
    }
    seq.skip();
    seq.advance(&outcome(StepKind::HelplineConnection)).unwrap();
    assert_eq!(seq.disposition(StepKind::HelplineConnection), Disposition::Skipped);
}

#[test]
fn progress_marks_reached_steps() {
    let mut seq = Sequencer::new();
    seq.advance(&outcome(StepKind::Location)).unwrap();
    seq.skip();

    let progress = seq.progress();
    assert_eq!(progress.len(), STEP_COUNT);
    let reached: Vec<bool> = progress.iter().map(|p| p.reached).collect();
    assert_eq!(reached, vec![true, true, true, false, false]);
    assert_eq!(progress[0].disposition, Disposition::Completed);
    assert_eq!(progress[1].disposition, Disposition::Skipped);
    assert_eq!(progress[2].disposition, Disposition::Pending);
}
