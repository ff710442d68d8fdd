//! Reverse geocoding against a Nominatim-compatible service.
//!
//! Best-effort lookup: one request, no retry. Nominatim requires an
//! identifying `User-Agent`.

#[cfg(test)]
#[path = "nominatim_test.rs"]
mod nominatim_test;

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::ClientBuildError;
use super::types::{GeocodeError, ReverseGeocoder};

pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: &str, user_agent: &str, connect_timeout: Duration) -> Result<Self, ClientBuildError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ClientBuildError(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }
}

#[async_trait::async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn reverse(&self, lat: f64, lng: f64) -> Result<String, GeocodeError> {
        let response = self
            .http
            .get(reverse_url(&self.base_url, lat, lng))
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(GeocodeError::Status(status));
        }
        let body = response
            .text()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;
        let address = parse_reverse(&body)?;
        debug!(lat, lng, %address, "reverse geocoded");
        Ok(address)
    }
}

#[derive(Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
}

fn reverse_url(base_url: &str, lat: f64, lng: f64) -> String {
    format!("{base_url}/reverse?format=json&lat={lat}&lon={lng}")
}

fn parse_reverse(body: &str) -> Result<String, GeocodeError> {
    let parsed: ReverseResponse = serde_json::from_str(body).map_err(|e| GeocodeError::Parse(e.to_string()))?;
    parsed
        .display_name
        .filter(|name| !name.trim().is_empty())
        .ok_or(GeocodeError::NoAddress)
}
