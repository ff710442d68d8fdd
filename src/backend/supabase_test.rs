use super::*;
use uuid::Uuid;

const USER_ID: &str = "6f1c7c3e-2b1a-4e8e-9a5c-0d1f2e3a4b5c";

fn token_body(expires_at: Option<i64>) -> String {
    let mut body = serde_json::json!({
        "access_token": "jwt-access",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh-1",
        "user": { "id": USER_ID, "email": "a@b.test", "role": "authenticated" }
    });
    if let Some(at) = expires_at {
        body["expires_at"] = serde_json::json!(at);
    }
    body.to_string()
}

// =============================================================================
// paths
// =============================================================================

#[test]
fn token_path_includes_grant_type() {
    assert_eq!(token_path("password"), "/auth/v1/token?grant_type=password");
    assert_eq!(token_path("refresh_token"), "/auth/v1/token?grant_type=refresh_token");
}

#[test]
fn table_path_targets_rest_endpoint() {
    assert_eq!(table_path(LOCATIONS_TABLE), "/rest/v1/emergency_locations");
}

// =============================================================================
// parse_session
// =============================================================================

#[test]
fn parse_session_prefers_expires_at() {
    let session = parse_session(&token_body(Some(1_700_000_000)), 5).unwrap();
    assert_eq!(session.access_token, "jwt-access");
    assert_eq!(session.refresh_token, "refresh-1");
    assert_eq!(session.expires_at, 1_700_000_000);
    assert_eq!(session.user.id, Uuid::parse_str(USER_ID).unwrap());
    assert_eq!(session.user.email.as_deref(), Some("a@b.test"));
}

#[test]
fn parse_session_derives_expiry_from_expires_in() {
    let session = parse_session(&token_body(None), 1000).unwrap();
    assert_eq!(session.expires_at, 4600);
}

#[test]
fn parse_session_rejects_garbage() {
    assert!(matches!(parse_session("<html>", 0), Err(AuthError::Parse(_))));
}

// =============================================================================
// parse_sign_up
// =============================================================================

#[test]
fn sign_up_with_session_signs_in() {
    let outcome = parse_sign_up(&token_body(Some(10)), 0).unwrap();
    assert!(matches!(outcome, SignUpOutcome::SignedIn(s) if s.access_token == "jwt-access"));
}

#[test]
fn sign_up_bare_user_needs_confirmation() {
    let body = serde_json::json!({
        "id": USER_ID,
        "email": "a@b.test",
        "confirmation_sent_at": "2026-01-01T00:00:00Z",
    });
    let outcome = parse_sign_up(&body.to_string(), 0).unwrap();
    assert!(matches!(outcome, SignUpOutcome::ConfirmationSent(u) if u.email.as_deref() == Some("a@b.test")));
}

#[test]
fn sign_up_wrapped_without_session_needs_confirmation() {
    let body = serde_json::json!({ "user": { "id": USER_ID }, "session": null });
    let outcome = parse_sign_up(&body.to_string(), 0).unwrap();
    assert!(matches!(outcome, SignUpOutcome::ConfirmationSent(_)));
}

// =============================================================================
// error_message
// =============================================================================

#[test]
fn error_message_prefers_description() {
    let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
    assert_eq!(error_message(400, body), "Invalid login credentials");
}

#[test]
fn error_message_reads_msg_field() {
    let body = r#"{"code":422,"error_code":"weak_password","msg":"Password should be at least 6 characters."}"#;
    assert_eq!(error_message(422, body), "Password should be at least 6 characters.");
}

#[test]
fn error_message_falls_back_to_error_string() {
    assert_eq!(error_message(400, r#"{"error":"invalid_request"}"#), "invalid_request");
}

#[test]
fn error_message_non_json_includes_status() {
    assert_eq!(error_message(502, "Bad Gateway"), "502: Bad Gateway");
}

// =============================================================================
// row wire format
// =============================================================================

#[test]
fn location_row_serializes_pending_status() {
    let row = EmergencyLocationRow {
        user_id: Uuid::parse_str(USER_ID).unwrap(),
        latitude: 28.61,
        longitude: 77.20,
        address: "New Delhi, India".into(),
        status: crate::backend::LocationStatus::Pending,
    };
    let value = serde_json::to_value([&row]).unwrap();
    assert_eq!(value[0]["status"], "pending");
    assert_eq!(value[0]["user_id"], USER_ID);
    assert_eq!(value[0]["latitude"], 28.61);
    assert_eq!(value[0]["address"], "New Delhi, India");
}

#[test]
fn client_trims_trailing_slash() {
    let client = SupabaseClient::new("https://p.supabase.co/", "anon", Duration::from_secs(1)).unwrap();
    assert_eq!(client.base_url, "https://p.supabase.co");
}
