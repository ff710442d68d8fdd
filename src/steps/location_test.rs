use super::*;
use crate::app::test_helpers::*;
use crate::backend::LocationStatus;
use crate::device::{DEFAULT_MAP_CENTER, LOCATE_FALLBACK_NOTICE};
use crate::steps::{GEOCODE_FAILED_MESSAGE, SAVE_FAILED_MESSAGE, SIGN_IN_REQUIRED_MESSAGE};

fn step(rig: &TestRig) -> LocationStep {
    LocationStep::new(rig.geocoder.clone(), rig.store.clone(), rig.devices.clone())
}

#[tokio::test]
async fn pick_resolves_address() {
    let rig = TestRig::default();
    let mut location = step(&rig);

    let record = location.select_point(28.61, 77.20).await.unwrap().clone();

    assert_eq!(record, LocationRecord { lat: 28.61, lng: 77.20, address: "New Delhi, India".into() });
    assert_eq!(rig.geocoder.calls(), vec![(28.61, 77.20)]);
    assert!(location.can_confirm());
    assert!(rig.store.inserts().is_empty());
}

#[tokio::test]
async fn confirm_inserts_one_pending_row() {
    let rig = TestRig::default();
    let auth = rig.signed_in_auth().await;
    let mut location = step(&rig);
    location.select_point(28.61, 77.20).await.unwrap();

    let record = location.confirm(&auth).await.unwrap();

    assert_eq!(record.address, "New Delhi, India");
    let inserts = rig.store.inserts();
    assert_eq!(inserts.len(), 1);
    let (token, row) = &inserts[0];
    assert_eq!(token, "access-token");
    assert_eq!(row.user_id, test_user().id);
    assert_eq!((row.latitude, row.longitude), (28.61, 77.20));
    assert_eq!(row.address, "New Delhi, India");
    assert_eq!(row.status, LocationStatus::Pending);
    assert!(!location.is_saving());
}

#[tokio::test]
async fn confirm_without_pick_makes_no_request() {
    let rig = TestRig::default();
    let auth = rig.signed_in_auth().await;
    let mut location = step(&rig);

    let err = location.confirm(&auth).await.unwrap_err();

    assert!(matches!(err, StepError::NoSelection));
    assert!(!location.can_confirm());
    assert!(rig.store.inserts().is_empty());
}

#[tokio::test]
async fn confirm_signed_out_makes_no_request() {
    let rig = TestRig::default();
    let auth = rig.auth();
    let mut location = step(&rig);
    location.select_point(28.61, 77.20).await.unwrap();

    let err = location.confirm(&auth).await.unwrap_err();

    assert!(matches!(err, StepError::NotSignedIn));
    assert_eq!(location.error(), Some(SIGN_IN_REQUIRED_MESSAGE));
    assert!(rig.store.inserts().is_empty());
}

#[tokio::test]
async fn failed_lookup_keeps_previous_pick() {
    let rig = TestRig::default();
    let mut location = step(&rig);
    location.select_point(28.61, 77.20).await.unwrap();

    rig.geocoder.set_address(None);
    let err = location.select_point(19.07, 72.87).await.unwrap_err();

    assert!(matches!(err, StepError::Geocode(_)));
    assert_eq!(location.error(), Some(GEOCODE_FAILED_MESSAGE));
    assert_eq!(location.selection().unwrap().address, "New Delhi, India");
    assert_eq!(location.selection().unwrap().lat, 28.61);
}

#[tokio::test]
async fn failed_save_reports_message() {
    let rig = TestRig { store: Arc::new(MockStore { fail: true, ..Default::default() }), ..Default::default() };
    let auth = rig.signed_in_auth().await;
    let mut location = step(&rig);
    location.select_point(28.61, 77.20).await.unwrap();

    let err = location.confirm(&auth).await.unwrap_err();

    assert!(matches!(err, StepError::Save(_)));
    assert_eq!(location.error(), Some(SAVE_FAILED_MESSAGE));
    assert!(location.can_confirm());
}

#[tokio::test]
async fn off_map_point_is_rejected_before_lookup() {
    let rig = TestRig::default();
    let mut location = step(&rig);

    let err = location.select_point(95.0, 10.0).await.unwrap_err();

    assert!(matches!(err, StepError::InvalidCoordinates { .. }));
    assert!(rig.geocoder.calls().is_empty());
}

#[tokio::test]
async fn locate_falls_back_to_default_center() {
    let rig = TestRig::default();
    let center = step(&rig).locate().await;
    assert_eq!(center.center, DEFAULT_MAP_CENTER);
    assert_eq!(center.notice, Some(LOCATE_FALLBACK_NOTICE));
}
