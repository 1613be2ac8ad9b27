//! Application settings loaded from the environment (and `.env`, if present).

use crate::location::GeocodingCredentials;
use crate::ranking::types::{MAX_DEPTH, MIN_DEPTH};
use crate::ranking::{Device, RequestDefaults};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub const DATAFORSEO_BASE_URL: &str = "https://api.dataforseo.com/v3";
pub const DATAFORSEO_SANDBOX_URL: &str = "https://sandbox.dataforseo.com/v3";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
    #[error("failed to load env file: {0}")]
    EnvFile(String),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub dataforseo_login: String,
    pub dataforseo_password: String,

    pub google_maps_api_key: Option<String>,
    pub opencage_api_key: Option<String>,

    pub environment: String,
    pub debug: bool,
    pub api_host: String,
    pub api_port: u16,

    pub default_language: String,
    pub default_device: Device,
    pub default_depth: u32,

    pub request_timeout: Duration,
}

impl Settings {
    /// Load from the process environment after reading `.env` if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from a specific env file, then the process environment.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile(e.to_string()))?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let settings = Self {
            dataforseo_login: required("DATAFORSEO_LOGIN")?,
            dataforseo_password: required("DATAFORSEO_PASSWORD")?,
            // Present-but-blank keys are kept so the chain builder can report them.
            google_maps_api_key: lookup("GOOGLE_MAPS_API_KEY"),
            opencage_api_key: lookup("OPENCAGE_API_KEY"),
            environment: get("ENVIRONMENT").unwrap_or_else(|| "development".into()),
            debug: parse_bool("DEBUG", get("DEBUG"), true)?,
            api_host: get("API_HOST").unwrap_or_else(|| "127.0.0.1".into()),
            api_port: parse_num("API_PORT", get("API_PORT"), 8000)?,
            default_language: get("DEFAULT_LANGUAGE").unwrap_or_else(|| "en".into()),
            default_device: match get("DEFAULT_DEVICE") {
                Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key: "DEFAULT_DEVICE", value: v })?,
                None => Device::Desktop,
            },
            default_depth: parse_num("DEFAULT_DEPTH", get("DEFAULT_DEPTH"), 40)?,
            request_timeout: Duration::from_secs(parse_num(
                "REQUEST_TIMEOUT_SECS",
                get("REQUEST_TIMEOUT_SECS"),
                30,
            )?),
        };

        if !(MIN_DEPTH..=MAX_DEPTH).contains(&settings.default_depth) {
            return Err(ConfigError::Invalid {
                key: "DEFAULT_DEPTH",
                value: settings.default_depth.to_string(),
            });
        }

        Ok(settings)
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Sandbox API in development, production API otherwise.
    pub fn dataforseo_url(&self) -> &'static str {
        if self.is_development() {
            DATAFORSEO_SANDBOX_URL
        } else {
            DATAFORSEO_BASE_URL
        }
    }

    pub fn geocoding_credentials(&self) -> GeocodingCredentials {
        GeocodingCredentials {
            google_api_key: self.google_maps_api_key.clone(),
            opencage_api_key: self.opencage_api_key.clone(),
        }
    }

    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            language_code: self.default_language.clone(),
            device: self.default_device,
            depth: self.default_depth,
        }
    }

    /// Log which optional keys are set, never their values.
    pub fn log_summary(&self) {
        info!(
            environment = %self.environment,
            debug = self.debug,
            dataforseo_url = self.dataforseo_url(),
            google_maps_key = self.google_maps_api_key.is_some(),
            opencage_key = self.opencage_api_key.is_some(),
            timeout_secs = self.request_timeout.as_secs(),
            "settings loaded"
        );
    }
}

/// Geocoding credentials and timeout only. Used by commands that never
/// touch DataForSEO, so the account keys are not required.
pub fn geocoding_from_env() -> Result<(GeocodingCredentials, Duration), ConfigError> {
    dotenvy::dotenv().ok();
    geocoding_from_lookup(|key| std::env::var(key).ok())
}

pub fn geocoding_from_lookup<F>(lookup: F) -> Result<(GeocodingCredentials, Duration), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let timeout = parse_num(
        "REQUEST_TIMEOUT_SECS",
        lookup("REQUEST_TIMEOUT_SECS").filter(|v| !v.trim().is_empty()),
        30,
    )?;
    let creds = GeocodingCredentials {
        google_api_key: lookup("GOOGLE_MAPS_API_KEY"),
        opencage_api_key: lookup("OPENCAGE_API_KEY"),
    };
    Ok((creds, Duration::from_secs(timeout)))
}

fn parse_num<T: std::str::FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid { key, value: v }),
        None => Ok(default),
    }
}

fn parse_bool(key: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match raw.as_deref().map(|v| v.trim().to_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value: v.clone() }),
        },
    }
}
