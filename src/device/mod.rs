//! Device capabilities: geolocation, microphone, camera.
//!
//! DESIGN
//! ======
//! Capture hardware sits behind async traits so steps can be driven by the
//! terminal host (`local`) or by in-test fakes. Every acquired track is
//! wrapped in [`Scoped`], which stops it exactly once: explicitly through
//! [`Scoped::release`] on the success path, or from `Drop` on every other
//! exit (error, early return, step unmount).

pub mod local;

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;

use std::fmt;
use std::io::Cursor;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ErrorCategory, ErrorCode};

/// Map center used when the device position is unknown (India).
pub const DEFAULT_MAP_CENTER: Coordinates = Coordinates { lat: 20.5937, lng: 78.9629 };

pub const LOCATE_FALLBACK_NOTICE: &str = "Could not get your location. Please select manually.";

// =============================================================================
// COORDINATES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Validated constructor. `None` for non-finite or out-of-range values.
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        valid.then_some(Self { lat, lng })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Camera,
    Microphone,
    Geolocation,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Camera => "camera",
            Self::Microphone => "microphone",
            Self::Geolocation => "geolocation",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("{0} permission denied")]
    PermissionDenied(DeviceKind),
    #[error("{kind} unavailable: {reason}")]
    Unavailable { kind: DeviceKind, reason: String },
    #[error("{0} track already stopped")]
    TrackStopped(DeviceKind),
    #[error("capture failed: {0}")]
    Capture(String),
}

impl ErrorCode for DeviceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => "E_DEVICE_PERMISSION",
            Self::Unavailable { .. } => "E_DEVICE_UNAVAILABLE",
            Self::TrackStopped(_) => "E_DEVICE_TRACK_STOPPED",
            Self::Capture(_) => "E_DEVICE_CAPTURE",
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::PermissionDenied
    }
}

// =============================================================================
// TRACKS
// =============================================================================

/// A live capture stream from one device.
pub trait Track: Send {
    fn kind(&self) -> DeviceKind;

    /// Stop capturing and release the device. Must be idempotent.
    fn stop(&mut self);

    fn is_live(&self) -> bool;
}

pub trait AudioTrack: Track {
    /// Take the bytes captured since the previous call.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::TrackStopped`] once the track has been stopped.
    fn drain(&mut self) -> Result<Vec<u8>, DeviceError>;
}

pub trait VideoTrack: Track {
    /// Snapshot the current preview frame.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::TrackStopped`] once the track has been stopped.
    fn frame(&mut self) -> Result<VideoFrame, DeviceError>;
}

/// Raw RGB8 frame, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl VideoFrame {
    /// Encode as JPEG.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Capture`] for an empty frame, a buffer whose
    /// length does not match the dimensions, or an encoder failure.
    pub fn encode_jpeg(&self) -> Result<Vec<u8>, DeviceError> {
        if self.width == 0 || self.height == 0 {
            return Err(DeviceError::Capture("empty frame".into()));
        }
        let img = image::RgbImage::from_raw(self.width, self.height, self.rgb.clone())
            .ok_or_else(|| DeviceError::Capture("frame buffer size mismatch".into()))?;
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)
            .map_err(|e| DeviceError::Capture(e.to_string()))?;
        Ok(out)
    }
}

// =============================================================================
// SCOPED RELEASE
// =============================================================================

/// Owns an acquired track and guarantees it is stopped once.
pub struct Scoped<T: Track + ?Sized> {
    track: Box<T>,
    released: bool,
}

impl<T: Track + ?Sized> Scoped<T> {
    #[must_use]
    pub fn new(track: Box<T>) -> Self {
        Self { track, released: false }
    }

    /// Stop the track now instead of at drop.
    pub fn release(mut self) {
        self.stop_once();
    }

    fn stop_once(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.track.stop();
        debug!(device = %self.track.kind(), "device track released");
    }
}

impl<T: Track + ?Sized> Deref for Scoped<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.track
    }
}

impl<T: Track + ?Sized> DerefMut for Scoped<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.track
    }
}

impl<T: Track + ?Sized> Drop for Scoped<T> {
    fn drop(&mut self) {
        self.stop_once();
    }
}

// =============================================================================
// CAPABILITY TRAITS
// =============================================================================

#[async_trait::async_trait]
pub trait MediaDevices: Send + Sync {
    /// Request microphone access and start capturing.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] if access is denied or no device exists.
    async fn microphone(&self) -> Result<Box<dyn AudioTrack>, DeviceError>;

    /// Request camera access and start the live preview.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] if access is denied or no device exists.
    async fn camera(&self) -> Result<Box<dyn VideoTrack>, DeviceError>;
}

#[async_trait::async_trait]
pub trait Geolocator: Send + Sync {
    /// One-shot current position.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] if the position cannot be determined.
    async fn current_position(&self) -> Result<Coordinates, DeviceError>;
}

/// Initial map view for the location step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCenter {
    pub center: Coordinates,
    /// Shown to the user when the device position was not available.
    pub notice: Option<&'static str>,
}

/// Center the map on the device, falling back to [`DEFAULT_MAP_CENTER`].
pub async fn locate(geolocator: &dyn Geolocator) -> MapCenter {
    match geolocator.current_position().await {
        Ok(center) => MapCenter { center, notice: None },
        Err(e) => {
            warn!(error = %e, code = e.error_code(), "geolocation failed; using default map center");
            MapCenter { center: DEFAULT_MAP_CENTER, notice: Some(LOCATE_FALLBACK_NOTICE) }
        }
    }
}
