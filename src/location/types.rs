//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Which geocoding backend produced (or failed to produce) a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    Google,
    OpenCage,
    Nominatim,
}

impl ProviderKind {
    /// Name reported on the status surface.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Google => "GoogleV3",
            Self::OpenCage => "OpenCageGeocode",
            Self::Nominatim => "Nominatim",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Position of a provider inside the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotRole {
    Primary,
    Fallback,
    Free,
}

impl fmt::Display for SlotRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Fallback => write!(f, "fallback"),
            Self::Free => write!(f, "free"),
        }
    }
}

/// Structured location input as submitted by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationQuery {
    /// Full address or location name
    pub address: String,
    /// Postal/PIN code
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl LocationQuery {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    pub fn with_pincode(mut self, pincode: impl Into<String>) -> Self {
        self.pincode = Some(pincode.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Join address, pincode, city and country with ", ", skipping absent
    /// or blank optional fields.
    pub fn composite(&self) -> String {
        let mut parts = vec![self.address.trim()];
        for part in [&self.pincode, &self.city, &self.country].into_iter().flatten() {
            let part = part.trim();
            if !part.is_empty() {
                parts.push(part);
            }
        }
        parts.join(", ")
    }
}

/// Administrative component extracted from a provider payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    City,
    Country,
}

/// Raw outcome of a single provider lookup, before merging with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResult {
    pub latitude: f64,
    pub longitude: f64,
    pub components: BTreeMap<Component, String>,
}

impl ProviderResult {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            components: BTreeMap::new(),
        }
    }

    pub fn component(&self, component: Component) -> Option<&str> {
        self.components.get(&component).map(String::as_str)
    }

    /// Reject non-finite or out-of-range coordinates.
    pub fn validate(self) -> Result<Self, ProviderLookupError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lon_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lon_ok {
            Ok(self)
        } else {
            Err(ProviderLookupError::OutOfRange {
                lat: self.latitude,
                lon: self.longitude,
            })
        }
    }
}

/// A geocoded location handed to the ranking client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    /// The composite query string that was geocoded.
    pub address: String,
    #[serde(default)]
    pub pincode: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl ResolvedLocation {
    /// Merge a provider result with the original input. Components the
    /// provider did not supply fall back to the input's city/country.
    pub fn from_provider(input: &LocationQuery, query: String, result: ProviderResult) -> Self {
        let city = result
            .component(Component::City)
            .map(str::to_string)
            .or_else(|| non_blank(&input.city));
        let country = result
            .component(Component::Country)
            .map(str::to_string)
            .or_else(|| non_blank(&input.country));

        Self {
            address: query,
            pincode: input.pincode.clone(),
            latitude: result.latitude,
            longitude: result.longitude,
            city,
            country,
        }
    }

    pub fn display_line(&self) -> String {
        let place = match (&self.city, &self.country) {
            (Some(city), Some(country)) => format!("{}, {}", city, country),
            (Some(city), None) => city.clone(),
            (None, Some(country)) => country.clone(),
            (None, None) => self.address.clone(),
        };
        format!("{} ({:.4}, {:.4})", place, self.latitude, self.longitude)
    }
}

fn non_blank(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Binary health of a provider or of the chain as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Working,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub name: String,
    #[serde(rename = "type")]
    pub role: SlotRole,
    pub status: HealthState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodingStatus {
    pub status: HealthState,
    pub providers: Vec<ProviderStatus>,
}

/// A configured paid provider could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderInitError {
    #[error("{0} API key is empty")]
    EmptyKey(ProviderKind),
    #[error("{0} API key contains invalid characters")]
    MalformedKey(ProviderKind),
}

/// A single provider call produced no usable result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderLookupError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("provider returned status {0}")]
    ProviderStatus(String),
    #[error("no results for '{0}'")]
    NoResults(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("coordinates out of range: {lat}, {lon}")]
    OutOfRange { lat: f64, lon: f64 },
    #[error("lookup task failed: {0}")]
    Task(String),
}

impl From<ureq::Error> for ProviderLookupError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => Self::Status(code),
            ureq::Error::Transport(t) => Self::Network(t.to_string()),
        }
    }
}

/// Location resolution errors surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("No location specified")]
    EmptyQuery,
    #[error("Could not geocode location: {query}")]
    Exhausted { query: String },
}
