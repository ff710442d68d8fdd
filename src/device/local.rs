//! Devices for the terminal host.
//!
//! A terminal has no microphone or camera, so capture is backed by files the
//! user points at: the microphone replays an audio file one tick's worth of
//! bytes at a time, the camera previews a decoded still image. A source left
//! unset behaves as a refused permission.

#[cfg(test)]
#[path = "local_test.rs"]
mod local_test;

use std::path::PathBuf;

use super::{AudioTrack, Coordinates, DeviceError, DeviceKind, Geolocator, MediaDevices, Track, VideoFrame, VideoTrack};

#[derive(Debug, Clone, Default)]
pub struct LocalDevices {
    pub audio_source: Option<PathBuf>,
    pub image_source: Option<PathBuf>,
    pub audio_bytes_per_sec: usize,
    pub position: Option<Coordinates>,
}

#[async_trait::async_trait]
impl MediaDevices for LocalDevices {
    async fn microphone(&self) -> Result<Box<dyn AudioTrack>, DeviceError> {
        let path = self
            .audio_source
            .as_ref()
            .ok_or(DeviceError::PermissionDenied(DeviceKind::Microphone))?;
        let data = tokio::fs::read(path).await.map_err(|e| DeviceError::Unavailable {
            kind: DeviceKind::Microphone,
            reason: format!("{}: {e}", path.display()),
        })?;
        Ok(Box::new(ReplayAudioTrack::new(data, self.audio_bytes_per_sec)))
    }

    async fn camera(&self) -> Result<Box<dyn VideoTrack>, DeviceError> {
        let path = self
            .image_source
            .as_ref()
            .ok_or(DeviceError::PermissionDenied(DeviceKind::Camera))?;
        let bytes = tokio::fs::read(path).await.map_err(|e| DeviceError::Unavailable {
            kind: DeviceKind::Camera,
            reason: format!("{}: {e}", path.display()),
        })?;
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| DeviceError::Unavailable { kind: DeviceKind::Camera, reason: e.to_string() })?
            .to_rgb8();
        let frame = VideoFrame { width: decoded.width(), height: decoded.height(), rgb: decoded.into_raw() };
        Ok(Box::new(StillVideoTrack { frame, live: true }))
    }
}

#[async_trait::async_trait]
impl Geolocator for LocalDevices {
    async fn current_position(&self) -> Result<Coordinates, DeviceError> {
        self.position.ok_or_else(|| DeviceError::Unavailable {
            kind: DeviceKind::Geolocation,
            reason: "no device position configured".into(),
        })
    }
}

// =============================================================================
// TRACKS
// =============================================================================

pub(crate) struct ReplayAudioTrack {
    data: Vec<u8>,
    cursor: usize,
    chunk: usize,
    live: bool,
}

impl ReplayAudioTrack {
    pub(crate) fn new(data: Vec<u8>, chunk: usize) -> Self {
        Self { data, cursor: 0, chunk: chunk.max(1), live: true }
    }
}

impl Track for ReplayAudioTrack {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Microphone
    }

    fn stop(&mut self) {
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl AudioTrack for ReplayAudioTrack {
    fn drain(&mut self) -> Result<Vec<u8>, DeviceError> {
        if !self.live {
            return Err(DeviceError::TrackStopped(DeviceKind::Microphone));
        }
        let end = self.cursor.saturating_add(self.chunk).min(self.data.len());
        let chunk = self.data[self.cursor..end].to_vec();
        self.cursor = end;
        Ok(chunk)
    }
}

struct StillVideoTrack {
    frame: VideoFrame,
    live: bool,
}

impl Track for StillVideoTrack {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Camera
    }

    fn stop(&mut self) {
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl VideoTrack for StillVideoTrack {
    fn frame(&mut self) -> Result<VideoFrame, DeviceError> {
        if !self.live {
            return Err(DeviceError::TrackStopped(DeviceKind::Camera));
        }
        Ok(self.frame.clone())
    }
}
