//! Error taxonomy shared by every fallible operation.
//!
//! DESIGN
//! ======
//! Each module owns its own `thiserror` enum. This module only adds the
//! cross-cutting classification the front-end needs to decide what to do
//! with a failure: show it, or log it and leave the step where it is.
//! Nothing here is fatal to the emergency process; every category leaves
//! the user on the current step with retry or skip available.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use std::fmt;

/// Broad failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Sign-in/sign-up/session failures. Surfaced verbatim.
    Authentication,
    /// Camera, microphone, or geolocation access was refused. Logged only.
    PermissionDenied,
    /// Geocoder or row-store failures. Surfaced as a fixed message.
    Service,
    /// Missing selection, missing fields, missing auth. Blocks locally.
    Validation,
}

impl ErrorCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::PermissionDenied => "permission_denied",
            Self::Service => "service",
            Self::Validation => "validation",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable code + category for an error value.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;

    fn category(&self) -> ErrorCategory;

    /// Whether the front-end should show this error to the user.
    fn is_surfaced(&self) -> bool {
        self.category() != ErrorCategory::PermissionDenied
    }
}
