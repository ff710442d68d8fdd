//! Hosted identity + row-store client.
//!
//! Talks to the project's GoTrue endpoints under `/auth/v1` and its
//! PostgREST endpoints under `/rest/v1`. Every request carries the project
//! `apikey`; user-scoped requests also carry the session bearer token.
//!
//! ERROR HANDLING
//! ==============
//! Auth failures are reduced to the service's own message so it can be shown
//! verbatim. Row-store failures keep status and body for the log; the step
//! shows its own fixed message.

#[cfg(test)]
#[path = "supabase_test.rs"]
mod supabase_test;

use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::types::{
    AuthError, Credentials, EmergencyLocationRow, IdentityService, RowStore, Session, SignUpOutcome, StoreError, User,
};
use super::{ClientBuildError, now_unix};

pub const LOCATIONS_TABLE: &str = "emergency_locations";

pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Build a client for one project.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: &str, anon_key: &str, connect_timeout: Duration) -> Result<Self, ClientBuildError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ClientBuildError(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), anon_key: anon_key.to_string() })
    }

    fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.anon_key);
        match bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_auth(&self, builder: reqwest::RequestBuilder) -> Result<(u16, String), AuthError> {
        let response = builder
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        Ok((status, text))
    }
}

#[async_trait::async_trait]
impl IdentityService for SupabaseClient {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let body = PasswordGrant { email: &credentials.email, password: &credentials.password };
        let (status, text) = self
            .send_auth(self.request(Method::POST, &token_path("password"), None).json(&body))
            .await?;
        if status != 200 {
            return Err(AuthError::Rejected { status, message: error_message(status, &text) });
        }
        let session = parse_session(&text, now_unix())?;
        info!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
        let body = PasswordGrant { email: &credentials.email, password: &credentials.password };
        let (status, text) = self
            .send_auth(self.request(Method::POST, "/auth/v1/signup", None).json(&body))
            .await?;
        if status != 200 {
            return Err(AuthError::Rejected { status, message: error_message(status, &text) });
        }
        parse_sign_up(&text, now_unix())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let (status, text) = self
            .send_auth(self.request(Method::POST, "/auth/v1/logout", Some(access_token)))
            .await?;
        match status {
            200 | 204 => Ok(()),
            401 | 403 => Err(AuthError::Unauthorized),
            _ => Err(AuthError::Rejected { status, message: error_message(status, &text) }),
        }
    }

    async fn current_user(&self, access_token: &str) -> Result<User, AuthError> {
        let (status, text) = self
            .send_auth(self.request(Method::GET, "/auth/v1/user", Some(access_token)))
            .await?;
        match status {
            200 => serde_json::from_str(&text).map_err(|e| AuthError::Parse(e.to_string())),
            401 | 403 => Err(AuthError::Unauthorized),
            _ => Err(AuthError::Rejected { status, message: error_message(status, &text) }),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let body = RefreshGrant { refresh_token };
        let (status, text) = self
            .send_auth(self.request(Method::POST, &token_path("refresh_token"), None).json(&body))
            .await?;
        match status {
            200 => {
                debug!("session refreshed");
                parse_session(&text, now_unix())
            }
            400 | 401 | 403 => Err(AuthError::Unauthorized),
            _ => Err(AuthError::Rejected { status, message: error_message(status, &text) }),
        }
    }
}

#[async_trait::async_trait]
impl RowStore for SupabaseClient {
    async fn insert_location(&self, access_token: &str, row: &EmergencyLocationRow) -> Result<(), StoreError> {
        let response = self
            .request(Method::POST, &table_path(LOCATIONS_TABLE), Some(access_token))
            .header("Prefer", "return=minimal")
            .json(&[row])
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected { status: status.as_u16(), body });
        }
        info!(user_id = %row.user_id, table = LOCATIONS_TABLE, "location row inserted");
        Ok(())
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self, now_unix: i64) -> Session {
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| now_unix + self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS));
        Session { access_token: self.access_token, refresh_token: self.refresh_token, expires_at, user: self.user }
    }
}

const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Sign-up answers in one of three shapes depending on project settings.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    Wrapped { user: User, session: Option<TokenResponse> },
    Bare(User),
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

// =============================================================================
// HELPERS
// =============================================================================

fn token_path(grant_type: &str) -> String {
    format!("/auth/v1/token?grant_type={grant_type}")
}

fn table_path(table: &str) -> String {
    format!("/rest/v1/{table}")
}

fn parse_session(body: &str, now_unix: i64) -> Result<Session, AuthError> {
    serde_json::from_str::<TokenResponse>(body)
        .map(|t| t.into_session(now_unix))
        .map_err(|e| AuthError::Parse(e.to_string()))
}

fn parse_sign_up(body: &str, now_unix: i64) -> Result<SignUpOutcome, AuthError> {
    let parsed: SignUpResponse = serde_json::from_str(body).map_err(|e| AuthError::Parse(e.to_string()))?;
    Ok(match parsed {
        SignUpResponse::Session(token) | SignUpResponse::Wrapped { session: Some(token), .. } => {
            SignUpOutcome::SignedIn(token.into_session(now_unix))
        }
        SignUpResponse::Wrapped { user, session: None } | SignUpResponse::Bare(user) => {
            SignUpOutcome::ConfirmationSent(user)
        }
    })
}

/// Pick the most descriptive message out of an error body.
fn error_message(status: u16, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let error = parsed.error.and_then(|v| v.as_str().map(str::to_string));
    [parsed.error_description, parsed.msg, parsed.message, error]
        .into_iter()
        .flatten()
        .find(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("{status}: {body}"))
}
