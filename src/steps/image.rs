//! Image verification step: live camera preview, one snapshot.

#[cfg(test)]
#[path = "image_test.rs"]
mod image_test;

use tracing::{info, warn};

use super::StepError;
use crate::device::{MediaDevices, Scoped, VideoTrack};
use crate::error::ErrorCode;

pub const IMAGE_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCapture {
    pub data: Vec<u8>,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Holds the camera from mount until capture or unmount.
pub struct ImageStep {
    preview: Option<Scoped<dyn VideoTrack>>,
    captured: bool,
}

impl ImageStep {
    /// Request the camera and start the preview. A refusal is logged and
    /// leaves the step without a preview.
    pub async fn mount(devices: &dyn MediaDevices) -> Self {
        let preview = match devices.camera().await {
            Ok(track) => Some(Scoped::new(track)),
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "camera unavailable; preview stalled");
                None
            }
        };
        Self { preview, captured: false }
    }

    #[must_use]
    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }

    #[must_use]
    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// Snapshot the preview as JPEG and release the camera.
    ///
    /// # Errors
    ///
    /// [`StepError::AlreadyCaptured`] after a successful capture,
    /// [`StepError::NoPreview`] when the camera was never granted, and
    /// [`StepError::Device`] if the frame cannot be grabbed or encoded (the
    /// preview is kept so the user can try again).
    pub fn capture(&mut self) -> Result<ImageCapture, StepError> {
        if self.captured {
            return Err(StepError::AlreadyCaptured);
        }
        let Some(preview) = self.preview.as_mut() else {
            warn!("capture requested without a camera preview");
            return Err(StepError::NoPreview);
        };

        let frame = preview.frame()?;
        let data = frame.encode_jpeg()?;
        let capture = ImageCapture { data, mime: IMAGE_MIME, width: frame.width, height: frame.height };

        self.unmount();
        self.captured = true;
        info!(width = capture.width, height = capture.height, bytes = capture.data.len(), "image captured");
        Ok(capture)
    }

    /// Release the camera. Safe to call more than once.
    pub fn unmount(&mut self) {
        if let Some(preview) = self.preview.take() {
            preview.release();
        }
    }
}
