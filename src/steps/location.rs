//! Location step: pick a point, resolve its address, save it.
//!
//! A pick triggers one reverse-geocode lookup. Confirming requires a picked
//! point and a signed-in user, both checked locally before anything is sent,
//! then inserts exactly one `pending` row. Failures leave the step where it
//! is with a message; the previous pick survives a failed lookup.

#[cfg(test)]
#[path = "location_test.rs"]
mod location_test;

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::StepError;
use crate::backend::{EmergencyLocationRow, LocationStatus, ReverseGeocoder, RowStore};
use crate::device::{self, Coordinates, Geolocator, MapCenter};
use crate::error::ErrorCode;
use crate::state::auth::AuthContext;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationRecord {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

pub struct LocationStep {
    geocoder: Arc<dyn ReverseGeocoder>,
    store: Arc<dyn RowStore>,
    geolocator: Arc<dyn Geolocator>,
    selection: Option<LocationRecord>,
    saving: bool,
    error: Option<String>,
}

impl LocationStep {
    #[must_use]
    pub fn new(geocoder: Arc<dyn ReverseGeocoder>, store: Arc<dyn RowStore>, geolocator: Arc<dyn Geolocator>) -> Self {
        Self { geocoder, store, geolocator, selection: None, saving: false, error: None }
    }

    /// Where to center the map before anything is picked.
    pub async fn locate(&self) -> MapCenter {
        device::locate(self.geolocator.as_ref()).await
    }

    #[must_use]
    pub fn selection(&self) -> Option<&LocationRecord> {
        self.selection.as_ref()
    }

    /// Message from the most recent failed action, cleared by the next one.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    #[must_use]
    pub fn can_confirm(&self) -> bool {
        self.selection.is_some() && !self.saving
    }

    /// Pick a point and look up its address.
    ///
    /// # Errors
    ///
    /// [`StepError::InvalidCoordinates`] for an off-map point,
    /// [`StepError::Geocode`] if the lookup fails. The prior pick is kept.
    pub async fn select_point(&mut self, lat: f64, lng: f64) -> Result<&LocationRecord, StepError> {
        self.error = None;
        let Some(point) = Coordinates::new(lat, lng) else {
            return Err(self.fail(StepError::InvalidCoordinates { lat, lng }));
        };
        match self.geocoder.reverse(point.lat, point.lng).await {
            Ok(address) => {
                let record = self
                    .selection
                    .insert(LocationRecord { lat: point.lat, lng: point.lng, address });
                Ok(record)
            }
            Err(e) => {
                warn!(error = %e, code = e.error_code(), lat, lng, "reverse geocode failed");
                Err(self.fail(StepError::Geocode(e)))
            }
        }
    }

    /// Save the picked point for the signed-in user.
    ///
    /// # Errors
    ///
    /// [`StepError::NoSelection`] or [`StepError::NotSignedIn`] without any
    /// network call; [`StepError::Save`] if the insert fails.
    pub async fn confirm(&mut self, auth: &AuthContext) -> Result<LocationRecord, StepError> {
        self.error = None;
        let Some(record) = self.selection.clone() else {
            return Err(self.fail(StepError::NoSelection));
        };
        let Some(session) = auth.session() else {
            return Err(self.fail(StepError::NotSignedIn));
        };

        let row = EmergencyLocationRow {
            user_id: session.user.id,
            latitude: record.lat,
            longitude: record.lng,
            address: record.address.clone(),
            status: LocationStatus::Pending,
        };

        self.saving = true;
        let result = self.store.insert_location(&session.access_token, &row).await;
        self.saving = false;

        match result {
            Ok(()) => {
                info!(user_id = %row.user_id, address = %record.address, "emergency location saved");
                Ok(record)
            }
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "saving location failed");
                Err(self.fail(StepError::Save(e)))
            }
        }
    }

    fn fail(&mut self, error: StepError) -> StepError {
        self.error = Some(error.to_string());
        error
    }
}
