//! Step handlers, one per wizard step kind.
//!
//! Each handler performs its step's single external side effect and hands
//! the result back to the caller as a typed value. Handlers never move the
//! wizard themselves; the caller passes the result to
//! `EmergencyProcess::complete` or calls `skip`.

pub mod helpline;
pub mod image;
pub mod location;
pub mod questionnaire;
pub mod voice;

use crate::backend::{GeocodeError, StoreError};
use crate::device::DeviceError;
use crate::error::{ErrorCategory, ErrorCode};

pub use helpline::{ConnectionStatus, HelplineConnected, HelplineStep};
pub use image::{ImageCapture, ImageStep};
pub use location::{LocationRecord, LocationStep};
pub use questionnaire::{QuestionnaireAnswer, QuestionnaireStep};
pub use voice::{AudioClip, VoiceStep};

pub const GEOCODE_FAILED_MESSAGE: &str = "Failed to get address for selected location. Please try again.";
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save location. Please try again.";
pub const SIGN_IN_REQUIRED_MESSAGE: &str = "Please sign in to continue";

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("({lat}, {lng}) is not a point on the map")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("Select a location on the map first")]
    NoSelection,

    #[error("{}", SIGN_IN_REQUIRED_MESSAGE)]
    NotSignedIn,

    #[error("{}", GEOCODE_FAILED_MESSAGE)]
    Geocode(#[source] GeocodeError),

    #[error("{}", SAVE_FAILED_MESSAGE)]
    Save(#[source] StoreError),

    #[error("Choose an answer before continuing")]
    NoAnswer,

    #[error("A voice message was already recorded")]
    AlreadyRecorded,

    #[error("An image was already captured")]
    AlreadyCaptured,

    #[error("camera preview is not available")]
    NoPreview,

    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl ErrorCode for StepError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCoordinates { .. } => "E_STEP_INVALID_COORDINATES",
            Self::NoSelection => "E_STEP_NO_SELECTION",
            Self::NotSignedIn => "E_STEP_NOT_SIGNED_IN",
            Self::Geocode(_) => "E_STEP_GEOCODE",
            Self::Save(_) => "E_STEP_SAVE",
            Self::NoAnswer => "E_STEP_NO_ANSWER",
            Self::AlreadyRecorded => "E_STEP_ALREADY_RECORDED",
            Self::AlreadyCaptured => "E_STEP_ALREADY_CAPTURED",
            Self::NoPreview => "E_STEP_NO_PREVIEW",
            Self::Device(e) => e.error_code(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Geocode(_) | Self::Save(_) => ErrorCategory::Service,
            Self::NoPreview | Self::Device(_) => ErrorCategory::PermissionDenied,
            Self::InvalidCoordinates { .. }
            | Self::NoSelection
            | Self::NotSignedIn
            | Self::NoAnswer
            | Self::AlreadyRecorded
            | Self::AlreadyCaptured => ErrorCategory::Validation,
        }
    }
}
