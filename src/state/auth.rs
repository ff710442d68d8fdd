//! Auth-session state for the current user.
//!
//! DESIGN
//! ======
//! `AuthContext` is the only writer of the session. Screens that need the
//! user borrow the context; screens that react to sign-in/out hold a
//! `watch::Receiver<AuthState>` from [`AuthContext::subscribe`]. Nothing is
//! global.
//!
//! Sessions survive restarts through [`SessionStore`], a JSON file. On
//! [`AuthContext::restore`] an expired token is refreshed and the user is
//! re-validated; a revoked session is cleared, an unreachable service keeps
//! the stored one.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::backend::{AuthError, Credentials, IdentityService, Session, SignUpOutcome, User, now_unix};

pub const SIGN_UP_CONFIRMATION_NOTICE: &str = "Registration successful! Please check your email for verification.";

/// Authentication state tracking the current user and loading status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub loading: bool,
}

impl AuthState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

// =============================================================================
// SESSION STORE
// =============================================================================

/// JSON-file persistence for the signed-in session. `None` path keeps
/// sessions in memory only.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    path: Option<PathBuf>,
}

impl SessionStore {
    #[must_use]
    pub fn at(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self { path: None }
    }

    /// Load the stored session. A corrupt file is treated as no session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the file exists but cannot be read.
    pub async fn load(&self) -> Result<Option<Session>, AuthError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AuthError::Storage(e.to_string())),
        };
        match serde_json::from_slice(&bytes) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] on serialization or write failure.
    pub async fn save(&self, session: &Session) -> Result<(), AuthError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_vec_pretty(session).map_err(|e| AuthError::Storage(e.to_string()))?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if an existing file cannot be removed.
    pub async fn clear(&self) -> Result<(), AuthError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Storage(e.to_string())),
        }
    }
}

// =============================================================================
// AUTH CONTEXT
// =============================================================================

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpNotice {
    SignedIn,
    CheckEmail,
}

impl SignUpNotice {
    #[must_use]
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::SignedIn => None,
            Self::CheckEmail => Some(SIGN_UP_CONFIRMATION_NOTICE),
        }
    }
}

pub struct AuthContext {
    identity: Arc<dyn IdentityService>,
    sessions: SessionStore,
    session: Option<Session>,
    state: watch::Sender<AuthState>,
}

impl AuthContext {
    /// Starts in the loading state until [`restore`](Self::restore) runs.
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityService>, sessions: SessionStore) -> Self {
        let (state, _) = watch::channel(AuthState { user: None, loading: true });
        Self { identity, sessions, session: None, state }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Load the persisted session, refreshing or dropping it as needed.
    /// Always leaves the context out of the loading state.
    ///
    /// # Errors
    ///
    /// Returns the storage or service error that prevented a clean restore;
    /// the context is still usable (signed out, or signed in with the
    /// stored session when only re-validation failed).
    pub async fn restore(&mut self) -> Result<(), AuthError> {
        self.publish(true);
        let result = self.restore_inner().await;
        self.publish(false);
        result
    }

    async fn restore_inner(&mut self) -> Result<(), AuthError> {
        self.session = None;
        let Some(mut session) = self.sessions.load().await? else {
            return Ok(());
        };

        if session.is_expired_at(now_unix()) {
            match self.identity.refresh(&session.refresh_token).await {
                Ok(fresh) => {
                    session = fresh;
                    self.sessions.save(&session).await?;
                }
                Err(AuthError::Unauthorized) => {
                    info!("stored session revoked; signing out");
                    return self.sessions.clear().await;
                }
                Err(e) => {
                    warn!(error = %e, "could not refresh expired session");
                    return Err(e);
                }
            }
        }

        match self.identity.current_user(&session.access_token).await {
            Ok(user) => {
                session.user = user;
                self.session = Some(session);
                Ok(())
            }
            Err(AuthError::Unauthorized) => {
                info!("stored session rejected; signing out");
                self.sessions.clear().await
            }
            Err(e) => {
                warn!(error = %e, "could not re-validate session; keeping stored session");
                self.session = Some(session);
                Err(e)
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] without a network call when
    /// either field is blank, or the service's rejection.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        let credentials = Credentials::new(email, password)?;
        self.publish(true);
        let result = self.identity.sign_in(&credentials).await;
        let outcome = match result {
            Ok(session) => Ok(self.adopt(session).await),
            Err(e) => Err(e),
        };
        self.publish(false);
        outcome
    }

    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredentials`] without a network call when
    /// either field is blank, or the service's rejection.
    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<SignUpNotice, AuthError> {
        let credentials = Credentials::new(email, password)?;
        self.publish(true);
        let result = self.identity.sign_up(&credentials).await;
        let outcome = match result {
            Ok(SignUpOutcome::SignedIn(session)) => {
                self.adopt(session).await;
                Ok(SignUpNotice::SignedIn)
            }
            Ok(SignUpOutcome::ConfirmationSent(user)) => {
                info!(user_id = %user.id, "sign-up confirmation sent");
                Ok(SignUpNotice::CheckEmail)
            }
            Err(e) => Err(e),
        };
        self.publish(false);
        outcome
    }

    /// Sign out locally; the server-side revoke is best-effort.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the stored session cannot be removed.
    pub async fn sign_out(&mut self) -> Result<(), AuthError> {
        if let Some(session) = self.session.take() {
            if let Err(e) = self.identity.sign_out(&session.access_token).await {
                warn!(error = %e, "server-side sign-out failed");
            }
            info!(user_id = %session.user.id, "signed out");
        }
        let result = self.sessions.clear().await;
        self.publish(false);
        result
    }

    async fn adopt(&mut self, session: Session) -> User {
        let user = session.user.clone();
        if let Err(e) = self.sessions.save(&session).await {
            warn!(error = %e, "session not persisted");
        }
        self.session = Some(session);
        user
    }

    fn publish(&self, loading: bool) {
        self.state.send_replace(AuthState { user: self.user().cloned(), loading });
    }
}
