//! Application state shared by the front-end commands.
//!
//! DESIGN
//! ======
//! `AppState` bundles the single `AuthContext`, the navigator, and the
//! service/device handles step handlers mount with. Production wiring goes
//! through [`AppState::from_config`]; tests assemble it from mocks in
//! [`test_helpers`].

use std::path::PathBuf;
use std::sync::Arc;

use crate::backend::{ClientBuildError, IdentityService, NominatimClient, SupabaseClient};
use crate::config::AppConfig;
use crate::device::local::LocalDevices;
use crate::state::{AuthContext, Navigator, Route, Screen, SessionStore};
use crate::wizard::{EmergencyProcess, StepDeps};

pub struct AppState {
    pub auth: AuthContext,
    pub nav: Navigator,
    pub deps: StepDeps,
}

impl AppState {
    #[must_use]
    pub fn new(auth: AuthContext, deps: StepDeps) -> Self {
        Self { auth, nav: Navigator::new(), deps }
    }

    /// Wire the hosted services and terminal devices from config.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client fails to build.
    pub fn from_config(
        config: &AppConfig,
        audio_source: Option<PathBuf>,
        image_source: Option<PathBuf>,
    ) -> Result<Self, ClientBuildError> {
        let supabase = Arc::new(SupabaseClient::new(
            &config.supabase_url,
            &config.supabase_anon_key,
            config.connect_timeout,
        )?);
        let geocoder = Arc::new(NominatimClient::new(
            &config.geocoder_base_url,
            &config.geocoder_user_agent,
            config.connect_timeout,
        )?);
        let devices = Arc::new(LocalDevices {
            audio_source,
            image_source,
            audio_bytes_per_sec: config.audio_bytes_per_sec,
            position: config.device_position,
        });

        let identity: Arc<dyn IdentityService> = supabase.clone();
        let auth = AuthContext::new(identity, SessionStore::at(config.session_file.clone()));
        let deps = StepDeps {
            geocoder,
            store: supabase,
            geolocator: devices.clone(),
            devices,
            recording_limit_secs: config.recording_limit_secs,
            helpline_delay: config.helpline_connect_delay,
        };
        Ok(Self::new(auth, deps))
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.nav.screen(&self.auth.snapshot())
    }

    /// Navigate to the emergency process. `None` when the auth gate keeps
    /// the user elsewhere.
    pub async fn open_emergency_process(&mut self) -> Option<EmergencyProcess> {
        self.nav.navigate(Route::EmergencyProcess);
        match self.screen() {
            Screen::EmergencyProcess => Some(EmergencyProcess::start(self.deps.clone()).await),
            Screen::Loading | Screen::Auth | Screen::Home => None,
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
