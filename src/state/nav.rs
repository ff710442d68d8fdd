//! Screen routing gated by auth state.
//!
//! Two named routes exist once signed in (`Home`, `EmergencyProcess`).
//! While the session is loading nothing but the loading screen shows; while
//! signed out every request lands on the auth screen.

#[cfg(test)]
#[path = "nav_test.rs"]
mod nav_test;

use super::auth::AuthState;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Route {
    #[default]
    Home,
    EmergencyProcess,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Auth,
    Home,
    EmergencyProcess,
}

#[derive(Clone, Debug, Default)]
pub struct Navigator {
    requested: Route,
}

impl Navigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn navigate(&mut self, route: Route) {
        self.requested = route;
    }

    #[must_use]
    pub fn requested(&self) -> Route {
        self.requested
    }

    /// The screen to show for the current auth state.
    #[must_use]
    pub fn screen(&self, auth: &AuthState) -> Screen {
        if auth.loading {
            return Screen::Loading;
        }
        if !auth.is_authenticated() {
            return Screen::Auth;
        }
        match self.requested {
            Route::Home => Screen::Home,
            Route::EmergencyProcess => Screen::EmergencyProcess,
        }
    }
}
