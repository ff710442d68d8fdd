use super::*;
use crate::app::test_helpers::*;
use crate::backend::LocationStatus;
use crate::steps::{ConnectionStatus, QuestionnaireAnswer};
use crate::wizard::Disposition;

async fn skip_to(process: &mut EmergencyProcess, kind: StepKind) {
    while process.current() != kind {
        process.skip().await;
    }
}

#[tokio::test]
async fn new_delhi_location_is_saved_and_process_advances() {
    let rig = TestRig::default();
    let auth = rig.signed_in_auth().await;
    let mut process = EmergencyProcess::start(rig.deps()).await;
    assert_eq!(process.sequencer().index(), 0);

    let ActiveStep::Location(location) = process.active_mut() else {
        panic!("expected location step");
    };
    location.select_point(28.61, 77.20).await.unwrap();
    let record = location.confirm(&auth).await.unwrap();
    let transition = process.complete(&StepOutcome::Location(record)).await.unwrap();

    assert_eq!(transition, Transition { from: StepKind::Location, to: StepKind::Questionnaire });
    assert_eq!(process.sequencer().index(), 1);
    assert_eq!(process.active().kind(), StepKind::Questionnaire);

    let inserts = rig.store.inserts();
    assert_eq!(inserts.len(), 1);
    let row = &inserts[0].1;
    assert_eq!(row.user_id, test_user().id);
    assert_eq!((row.latitude, row.longitude), (28.61, 77.20));
    assert_eq!(row.address, "New Delhi, India");
    assert_eq!(row.status, LocationStatus::Pending);
}

#[tokio::test]
async fn mismatched_outcome_leaves_step_mounted() {
    let rig = TestRig::default();
    let mut process = EmergencyProcess::start(rig.deps()).await;

    let answer = StepOutcome::Questionnaire(QuestionnaireAnswer { needs_emergency_help: true });
    assert!(process.complete(&answer).await.is_err());

    assert_eq!(process.current(), StepKind::Location);
    assert_eq!(process.active().kind(), StepKind::Location);
}

#[tokio::test]
async fn leaving_image_step_releases_camera() {
    let rig = TestRig::default();
    let mut process = EmergencyProcess::start(rig.deps()).await;
    skip_to(&mut process, StepKind::ImageVerification).await;
    assert!(rig.devices.camera_live());

    process.skip().await;

    assert!(!rig.devices.camera_live());
    assert_eq!(process.active().kind(), StepKind::HelplineConnection);
    assert_eq!(process.sequencer().disposition(StepKind::ImageVerification), Disposition::Skipped);
}

#[tokio::test]
async fn dropping_process_releases_camera() {
    let rig = TestRig::default();
    let mut process = EmergencyProcess::start(rig.deps()).await;
    skip_to(&mut process, StepKind::ImageVerification).await;

    drop(process);

    assert!(!rig.devices.camera_live());
}

#[tokio::test(start_paused = true)]
async fn helpline_completes_the_process() {
    let rig = TestRig::default();
    let mut process = EmergencyProcess::start(rig.deps()).await;
    skip_to(&mut process, StepKind::HelplineConnection).await;

    let ActiveStep::Helpline(helpline) = process.active_mut() else {
        panic!("expected helpline step");
    };
    assert_eq!(helpline.status(), ConnectionStatus::Connecting);
    let connected = helpline.connected().await.unwrap();
    let transition = process.complete(&StepOutcome::Helpline(connected)).await.unwrap();

    assert!(!transition.moved());
    assert!(process.sequencer().is_settled());
    assert_eq!(process.sequencer().disposition(StepKind::HelplineConnection), Disposition::Completed);
    assert_eq!(process.active().kind(), StepKind::HelplineConnection);
}

#[tokio::test]
async fn progress_reflects_sequencer() {
    let rig = TestRig::default();
    let mut process = EmergencyProcess::start(rig.deps()).await;
    process.skip().await;

    let progress = process.progress();
    assert_eq!(progress[0].disposition, Disposition::Skipped);
    assert!(progress[1].reached);
    assert!(!progress[2].reached);
}
