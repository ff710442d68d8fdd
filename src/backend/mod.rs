//! Clients for the hosted services the app delegates to.
//!
//! DESIGN
//! ======
//! Steps and the auth context only see the traits in [`types`]:
//! `IdentityService`, `RowStore`, `ReverseGeocoder`. The concrete clients
//! (`supabase`, `nominatim`) are plain `reqwest` wrappers with a connect
//! timeout and no request timeout; a hung lookup blocks only its own step.

pub mod nominatim;
pub mod supabase;
pub mod types;

pub use nominatim::NominatimClient;
pub use supabase::SupabaseClient;
pub use types::{
    AuthError, Credentials, EmergencyLocationRow, GeocodeError, IdentityService, LocationStatus, ReverseGeocoder,
    RowStore, Session, SignUpOutcome, StoreError, User,
};

#[derive(Debug, thiserror::Error)]
#[error("HTTP client build failed: {0}")]
pub struct ClientBuildError(pub String);

pub(crate) fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
