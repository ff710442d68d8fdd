//! Voice verification step: record one capped voice message.
//!
//! DESIGN
//! ======
//! Recording is a single async call that owns the microphone for its whole
//! duration: acquire, tick once per second, stop on the caller's signal or
//! at the limit, release. The track is wrapped in `Scoped`, so a dropped
//! recording future (step unmounted mid-recording) still releases it.
//!
//! A refused microphone is logged and yields no clip; nothing is shown to
//! the user. There is one recording per step; no re-record.

#[cfg(test)]
#[path = "voice_test.rs"]
mod voice_test;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::StepError;
use crate::device::{MediaDevices, Scoped};
use crate::error::ErrorCode;

pub const AUDIO_MIME: &str = "audio/webm";

const TICK: Duration = Duration::from_secs(1);

enum Ended {
    Limit,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub data: Vec<u8>,
    pub mime: &'static str,
    /// Whole seconds recorded, never above the step limit.
    pub duration_secs: u32,
}

pub struct VoiceStep {
    devices: Arc<dyn MediaDevices>,
    limit_secs: u32,
    progress: watch::Sender<u32>,
    recording: bool,
    recorded: bool,
}

impl VoiceStep {
    #[must_use]
    pub fn new(devices: Arc<dyn MediaDevices>, limit_secs: u32) -> Self {
        let (progress, _) = watch::channel(0);
        Self { devices, limit_secs: limit_secs.max(1), progress, recording: false, recorded: false }
    }

    #[must_use]
    pub fn limit_secs(&self) -> u32 {
        self.limit_secs
    }

    #[must_use]
    pub fn prompt(&self) -> String {
        format!("Please record a {}-second voice message describing your situation", self.limit_secs)
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Seconds recorded so far in the current (or last) recording.
    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        *self.progress.borrow()
    }

    #[must_use]
    pub fn subscribe_elapsed(&self) -> watch::Receiver<u32> {
        self.progress.subscribe()
    }

    /// Record until `stop` resolves or the limit is reached.
    ///
    /// Returns `Ok(None)` when the microphone is refused or fails mid-way;
    /// the step stays ready for another attempt in that case.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::AlreadyRecorded`] once a clip has been produced.
    pub async fn record<F>(&mut self, stop: F) -> Result<Option<AudioClip>, StepError>
    where
        F: Future<Output = ()>,
    {
        if self.recorded {
            return Err(StepError::AlreadyRecorded);
        }

        let mut track = match self.devices.microphone().await {
            Ok(track) => Scoped::new(track),
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "microphone unavailable; not recording");
                return Ok(None);
            }
        };

        self.recording = true;
        self.progress.send_replace(0);
        info!(limit_secs = self.limit_secs, "voice recording started");

        let mut ticker = tokio::time::interval_at(Instant::now() + TICK, TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(stop);

        let mut data = Vec::new();
        let mut elapsed = 0u32;
        let captured = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    elapsed += 1;
                    self.progress.send_replace(elapsed);
                    match track.drain() {
                        Ok(chunk) => data.extend(chunk),
                        Err(e) => break Err(e),
                    }
                    if elapsed >= self.limit_secs {
                        debug!(elapsed, "recording limit reached");
                        break Ok(Ended::Limit);
                    }
                }
                () = &mut stop => {
                    debug!(elapsed, "recording stopped by user");
                    break Ok(Ended::Stopped);
                }
            }
        };

        // At the limit every elapsed second is already drained; only an early
        // stop leaves a partial second behind.
        if let Ok(Ended::Stopped) = captured {
            if let Ok(rest) = track.drain() {
                data.extend(rest);
            }
        }
        track.release();
        self.recording = false;

        match captured {
            Ok(_) => {
                self.recorded = true;
                info!(duration_secs = elapsed, bytes = data.len(), "voice recording finished");
                Ok(Some(AudioClip { data, mime: AUDIO_MIME, duration_secs: elapsed }))
            }
            Err(e) => {
                warn!(error = %e, "microphone failed while recording; clip discarded");
                Ok(None)
            }
        }
    }
}
