use super::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct CountingTrack {
    stops: Arc<AtomicUsize>,
    live: bool,
}

impl Track for CountingTrack {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Microphone
    }

    fn stop(&mut self) {
        self.live = false;
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

fn counting_track() -> (Box<CountingTrack>, Arc<AtomicUsize>) {
    let stops = Arc::new(AtomicUsize::new(0));
    (Box::new(CountingTrack { stops: stops.clone(), live: true }), stops)
}

struct FixedGeolocator(Option<Coordinates>);

#[async_trait::async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self) -> Result<Coordinates, DeviceError> {
        self.0.ok_or(DeviceError::PermissionDenied(DeviceKind::Geolocation))
    }
}

// =============================================================================
// Coordinates
// =============================================================================

#[test]
fn coordinates_accept_valid_range() {
    assert_eq!(Coordinates::new(28.61, 77.20), Some(Coordinates { lat: 28.61, lng: 77.20 }));
    assert!(Coordinates::new(-90.0, 180.0).is_some());
}

#[test]
fn coordinates_reject_out_of_range_and_nan() {
    assert!(Coordinates::new(90.5, 0.0).is_none());
    assert!(Coordinates::new(0.0, -180.5).is_none());
    assert!(Coordinates::new(f64::NAN, 0.0).is_none());
    assert!(Coordinates::new(0.0, f64::INFINITY).is_none());
}

// =============================================================================
// Scoped
// =============================================================================

#[test]
fn scoped_drop_stops_track() {
    let (track, stops) = counting_track();
    {
        let scoped = Scoped::new(track);
        assert!(scoped.is_live());
    }
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

#[test]
fn scoped_release_then_drop_stops_once() {
    let (track, stops) = counting_track();
    let scoped = Scoped::new(track);
    scoped.release();
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

#[test]
fn scoped_stops_on_early_return_path() {
    fn fails_midway(track: Box<CountingTrack>) -> Result<(), DeviceError> {
        let _scoped = Scoped::new(track);
        Err(DeviceError::Capture("boom".into()))
    }
    let (track, stops) = counting_track();
    assert!(fails_midway(track).is_err());
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

// =============================================================================
// VideoFrame::encode_jpeg
// =============================================================================

#[test]
fn encode_jpeg_produces_decodable_image() {
    let frame = VideoFrame { width: 4, height: 2, rgb: vec![200; 4 * 2 * 3] };
    let jpeg = frame.encode_jpeg().unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    let decoded = image::load_from_memory(&jpeg).unwrap();
    assert_eq!(decoded.width(), 4);
    assert_eq!(decoded.height(), 2);
}

#[test]
fn encode_jpeg_rejects_empty_frame() {
    let frame = VideoFrame { width: 0, height: 0, rgb: Vec::new() };
    assert!(matches!(frame.encode_jpeg(), Err(DeviceError::Capture(_))));
}

#[test]
fn encode_jpeg_rejects_short_buffer() {
    let frame = VideoFrame { width: 4, height: 4, rgb: vec![0; 10] };
    assert!(matches!(frame.encode_jpeg(), Err(DeviceError::Capture(_))));
}

// =============================================================================
// locate
// =============================================================================

#[tokio::test]
async fn locate_uses_device_position() {
    let here = Coordinates { lat: 28.61, lng: 77.20 };
    let view = locate(&FixedGeolocator(Some(here))).await;
    assert_eq!(view.center, here);
    assert_eq!(view.notice, None);
}

#[tokio::test]
async fn locate_falls_back_to_default_center() {
    let view = locate(&FixedGeolocator(None)).await;
    assert_eq!(view.center, DEFAULT_MAP_CENTER);
    assert_eq!(view.notice, Some(LOCATE_FALLBACK_NOTICE));
}

#[test]
fn device_errors_are_never_surfaced() {
    assert!(!DeviceError::PermissionDenied(DeviceKind::Camera).is_surfaced());
    assert!(!DeviceError::Capture("x".into()).is_surfaced());
}
