//! Backend types: service traits, domain rows, and per-service errors.
//!
//! Provider-neutral. The concrete clients live in `supabase` and
//! `nominatim`; tests implement these traits directly.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ErrorCategory, ErrorCode};

// =============================================================================
// ERRORS
// =============================================================================

/// Identity service failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Both fields must be filled before anything is sent.
    #[error("Please fill in all fields")]
    MissingCredentials,

    /// The service rejected the request. The message is shown as-is.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The access token is expired or revoked.
    #[error("session expired; please sign in again")]
    Unauthorized,

    /// The service could not be reached.
    #[error("auth request failed: {0}")]
    Request(String),

    /// The service answered with a body we could not parse.
    #[error("unexpected auth response: {0}")]
    Parse(String),

    #[error("session storage failed: {0}")]
    Storage(String),
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "E_AUTH_MISSING_CREDENTIALS",
            Self::Rejected { .. } => "E_AUTH_REJECTED",
            Self::Unauthorized => "E_AUTH_UNAUTHORIZED",
            Self::Request(_) => "E_AUTH_REQUEST",
            Self::Parse(_) => "E_AUTH_PARSE",
            Self::Storage(_) => "E_AUTH_STORAGE",
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingCredentials => ErrorCategory::Validation,
            _ => ErrorCategory::Authentication,
        }
    }
}

/// Row-store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("row store request failed: {0}")]
    Request(String),
    #[error("row store rejected insert: status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_STORE_REQUEST",
            Self::Rejected { .. } => "E_STORE_REJECTED",
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Service
    }
}

/// Reverse-geocoding failures.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocode request failed: {0}")]
    Request(String),
    #[error("geocoder returned status {0}")]
    Status(u16),
    #[error("geocode response parse failed: {0}")]
    Parse(String),
    #[error("no address found for this point")]
    NoAddress,
}

impl ErrorCode for GeocodeError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_GEOCODE_REQUEST",
            Self::Status(_) => "E_GEOCODE_STATUS",
            Self::Parse(_) => "E_GEOCODE_PARSE",
            Self::NoAddress => "E_GEOCODE_NO_ADDRESS",
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Service
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Trimmed email, untouched password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] if either field is blank.
    pub fn new(email: &str, password: &str) -> Result<Self, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        Ok(Self { email: email.to_string(), password: password.to_string() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// A signed-in session as issued by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds.
    pub expires_at: i64,
    pub user: User,
}

impl Session {
    #[must_use]
    pub fn is_expired_at(&self, now_unix: i64) -> bool {
        self.expires_at <= now_unix
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// Auto-confirmed project: the user is signed in right away.
    SignedIn(Session),
    /// A confirmation email was sent; no session yet.
    ConfirmationSent(User),
}

#[async_trait::async_trait]
pub trait IdentityService: Send + Sync {
    /// Email + password sign-in.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] on rejection or transport failure.
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// Email + password registration.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] on rejection or transport failure.
    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError>;

    /// Revoke the session server-side.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] on rejection or transport failure.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// Resolve the user behind an access token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] for an invalid token.
    async fn current_user(&self, access_token: &str) -> Result<User, AuthError>;

    /// Exchange a refresh token for a fresh session.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] on rejection or transport failure.
    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError>;
}

// =============================================================================
// ROW STORE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationStatus {
    Pending,
}

/// One row of the `emergency_locations` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyLocationRow {
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub status: LocationStatus,
}

#[async_trait::async_trait]
pub trait RowStore: Send + Sync {
    /// Insert one emergency location on behalf of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on rejection or transport failure.
    async fn insert_location(&self, access_token: &str, row: &EmergencyLocationRow) -> Result<(), StoreError>;
}

// =============================================================================
// REVERSE GEOCODER
// =============================================================================

#[async_trait::async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Human-readable address for a point.
    ///
    /// # Errors
    ///
    /// Returns a [`GeocodeError`] on any failure, including no match.
    async fn reverse(&self, lat: f64, lng: f64) -> Result<String, GeocodeError>;
}
