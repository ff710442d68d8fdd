use super::*;
use crate::app::test_helpers::*;

#[tokio::test]
async fn mount_starts_preview() {
    let devices = FakeDevices::default();
    let image = ImageStep::mount(&devices).await;
    assert!(image.has_preview());
    assert!(devices.camera_live());
}

#[tokio::test]
async fn capture_encodes_jpeg_and_releases_camera() {
    let devices = FakeDevices::default();
    let mut image = ImageStep::mount(&devices).await;

    let capture = image.capture().unwrap();

    assert_eq!(capture.mime, IMAGE_MIME);
    assert_eq!((capture.width, capture.height), (8, 6));
    assert_eq!(&capture.data[..2], &[0xFF, 0xD8]);
    assert!(image.is_captured());
    assert!(!image.has_preview());
    assert!(!devices.camera_live());
}

#[tokio::test]
async fn second_capture_is_rejected() {
    let devices = FakeDevices::default();
    let mut image = ImageStep::mount(&devices).await;
    image.capture().unwrap();

    assert!(matches!(image.capture(), Err(StepError::AlreadyCaptured)));
}

#[tokio::test]
async fn refused_camera_has_no_preview() {
    let devices = FakeDevices { deny_camera: true, ..Default::default() };
    let mut image = ImageStep::mount(&devices).await;

    assert!(!image.has_preview());
    let err = image.capture().unwrap_err();
    assert!(matches!(err, StepError::NoPreview));
    assert!(!err.is_surfaced());
}

#[tokio::test]
async fn unmount_and_drop_release_camera() {
    let devices = FakeDevices::default();
    let mut image = ImageStep::mount(&devices).await;
    image.unmount();
    assert!(!devices.camera_live());
    image.unmount();

    let image = ImageStep::mount(&devices).await;
    assert!(devices.camera_live());
    drop(image);
    assert!(!devices.camera_live());
}
