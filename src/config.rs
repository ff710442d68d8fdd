//! Runtime configuration parsed from environment variables.
//!
//! Required:
//! - `SUPABASE_URL`
//! - `SUPABASE_ANON_KEY`
//!
//! Everything else has a default; unparseable numbers fall back to it.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::time::Duration;

use crate::device::Coordinates;

pub const DEFAULT_GEOCODER_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RECORDING_LIMIT_SECS: u32 = 10;
pub const DEFAULT_HELPLINE_CONNECT_DELAY_MS: u64 = 3000;
pub const DEFAULT_SESSION_FILE: &str = ".safeline-session.json";
pub const DEFAULT_AUDIO_BYTES_PER_SEC: usize = 16_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing {var}; set it in the environment or a .env file")]
    Missing { var: &'static str },
    #[error("{var} is not a valid coordinate: {value}")]
    InvalidCoordinate { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub geocoder_base_url: String,
    pub geocoder_user_agent: String,
    pub connect_timeout: Duration,
    pub recording_limit_secs: u32,
    pub helpline_connect_delay: Duration,
    pub session_file: PathBuf,
    /// Fixed device position; `None` means geolocation is unavailable.
    pub device_position: Option<Coordinates>,
    pub audio_bytes_per_sec: usize,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when a required variable is absent or
    /// blank, and [`ConfigError::InvalidCoordinate`] when only one half of the
    /// device position is set or either half fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let supabase_url = required("SUPABASE_URL")?.trim_end_matches('/').to_string();
        let supabase_anon_key = required("SUPABASE_ANON_KEY")?;

        let geocoder_base_url = std::env::var("GEOCODER_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEOCODER_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let geocoder_user_agent = std::env::var("GEOCODER_USER_AGENT")
            .unwrap_or_else(|_| format!("safeline/{}", env!("CARGO_PKG_VERSION")));

        let session_file = std::env::var("SAFELINE_SESSION_FILE")
            .map_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from);

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            geocoder_base_url,
            geocoder_user_agent,
            connect_timeout: Duration::from_secs(env_parse("HTTP_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)),
            recording_limit_secs: env_parse("RECORDING_LIMIT_SECS", DEFAULT_RECORDING_LIMIT_SECS),
            helpline_connect_delay: Duration::from_millis(env_parse(
                "HELPLINE_CONNECT_DELAY_MS",
                DEFAULT_HELPLINE_CONNECT_DELAY_MS,
            )),
            session_file,
            device_position: device_position()?,
            audio_bytes_per_sec: env_parse("SAFELINE_AUDIO_BYTES_PER_SEC", DEFAULT_AUDIO_BYTES_PER_SEC),
        })
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::Missing { var }),
    }
}

fn device_position() -> Result<Option<Coordinates>, ConfigError> {
    let lat = std::env::var("SAFELINE_DEVICE_LAT").ok();
    let lng = std::env::var("SAFELINE_DEVICE_LNG").ok();
    match (lat, lng) {
        (None, None) => Ok(None),
        (Some(lat), Some(lng)) => {
            let lat = parse_coordinate("SAFELINE_DEVICE_LAT", &lat)?;
            let lng = parse_coordinate("SAFELINE_DEVICE_LNG", &lng)?;
            Coordinates::new(lat, lng).map(Some).ok_or_else(|| ConfigError::InvalidCoordinate {
                var: "SAFELINE_DEVICE_LAT",
                value: format!("{lat},{lng}"),
            })
        }
        (None, Some(_)) => Err(ConfigError::InvalidCoordinate { var: "SAFELINE_DEVICE_LAT", value: String::new() }),
        (Some(_), None) => Err(ConfigError::InvalidCoordinate { var: "SAFELINE_DEVICE_LNG", value: String::new() }),
    }
}

fn parse_coordinate(var: &'static str, raw: &str) -> Result<f64, ConfigError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidCoordinate { var, value: raw.to_string() })
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
