//! Client state: the auth session and screen routing.

pub mod auth;
pub mod nav;

pub use auth::{AuthContext, AuthState, SessionStore, SignUpNotice};
pub use nav::{Navigator, Route, Screen};
