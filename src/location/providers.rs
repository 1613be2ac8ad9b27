//! Geocoding providers: Google Maps, OpenCage, and OpenStreetMap Nominatim.
//!
//! Every provider is a blocking HTTP client over a shared `ureq::Agent`.
//! The resolver moves lookups onto the blocking pool.

use super::normalize::{self, PayloadShape};
use super::types::{ProviderInitError, ProviderKind, ProviderLookupError, ProviderResult};
use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;

pub const USER_AGENT: &str = "RankTracker-Prototype/1.0";

const GOOGLE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const OPENCAGE_URL: &str = "https://api.opencagedata.com/geocode/v1/json";
const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// A single geocoding backend.
pub trait Geocoder: Send + Sync + Debug {
    fn kind(&self) -> ProviderKind;

    /// Geocode `query`, returning the first (highest-ranked) candidate.
    fn lookup(&self, query: &str) -> Result<ProviderResult, ProviderLookupError>;
}

/// Build the agent shared by all providers.
pub fn http_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// The closed set of HTTP-backed providers, selected by `kind`.
#[derive(Debug, Clone)]
pub struct HttpGeocoder {
    kind: ProviderKind,
    agent: ureq::Agent,
    base_url: String,
    api_key: Option<String>,
}

impl HttpGeocoder {
    pub fn google(api_key: &str, agent: ureq::Agent) -> Result<Self, ProviderInitError> {
        let key = validate_key(ProviderKind::Google, api_key)?;
        Ok(Self { kind: ProviderKind::Google, agent, base_url: GOOGLE_URL.into(), api_key: Some(key) })
    }

    pub fn opencage(api_key: &str, agent: ureq::Agent) -> Result<Self, ProviderInitError> {
        let key = validate_key(ProviderKind::OpenCage, api_key)?;
        Ok(Self { kind: ProviderKind::OpenCage, agent, base_url: OPENCAGE_URL.into(), api_key: Some(key) })
    }

    pub fn nominatim(agent: ureq::Agent) -> Self {
        Self { kind: ProviderKind::Nominatim, agent, base_url: NOMINATIM_URL.into(), api_key: None }
    }

    /// Point the provider at a different endpoint (self-hosted Nominatim, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    fn fetch(&self, query: &str) -> Result<Value, ProviderLookupError> {
        let request = match self.kind {
            ProviderKind::Google => self
                .agent
                .get(&self.base_url)
                .query("address", query)
                .query("key", self.key()),
            ProviderKind::OpenCage => self
                .agent
                .get(&self.base_url)
                .query("q", query)
                .query("key", self.key())
                .query("limit", "1")
                .query("no_annotations", "1"),
            ProviderKind::Nominatim => self
                .agent
                .get(&self.base_url)
                .query("q", query)
                .query("format", "json")
                .query("limit", "1"),
        };

        let response = request.call()?;
        response
            .into_json()
            .map_err(|e| ProviderLookupError::InvalidResponse(e.to_string()))
    }
}

impl Geocoder for HttpGeocoder {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn lookup(&self, query: &str) -> Result<ProviderResult, ProviderLookupError> {
        let body = self.fetch(query)?;
        parse_response(self.kind, query, &body)
    }
}

/// Reject keys that can never authenticate.
fn validate_key(kind: ProviderKind, key: &str) -> Result<String, ProviderInitError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ProviderInitError::EmptyKey(kind));
    }
    if !key.chars().all(|c| c.is_ascii_graphic()) {
        return Err(ProviderInitError::MalformedKey(kind));
    }
    Ok(key.to_string())
}

/// Shape each provider normally returns.
pub fn expected_shape(kind: ProviderKind) -> PayloadShape {
    match kind {
        ProviderKind::Google => PayloadShape::TypedComponents,
        ProviderKind::OpenCage => PayloadShape::KeyedComponents,
        ProviderKind::Nominatim => PayloadShape::DisplayName,
    }
}

/// Turn a provider response body into a `ProviderResult`.
pub fn parse_response(
    kind: ProviderKind,
    query: &str,
    body: &Value,
) -> Result<ProviderResult, ProviderLookupError> {
    let first = first_candidate(kind, query, body)?;
    let (latitude, longitude) = coordinates(kind, first)?;

    let mut result = ProviderResult::new(latitude, longitude);
    result.components = normalize::extract(first, expected_shape(kind));
    Ok(result)
}

fn first_candidate<'a>(
    kind: ProviderKind,
    query: &str,
    body: &'a Value,
) -> Result<&'a Value, ProviderLookupError> {
    let candidates = match kind {
        ProviderKind::Google => {
            let status = body.get("status").and_then(Value::as_str).unwrap_or("UNKNOWN");
            match status {
                "OK" => {}
                "ZERO_RESULTS" => return Err(ProviderLookupError::NoResults(query.to_string())),
                other => {
                    let detail = body
                        .get("error_message")
                        .and_then(Value::as_str)
                        .map(|m| format!("{}: {}", other, m))
                        .unwrap_or_else(|| other.to_string());
                    return Err(ProviderLookupError::ProviderStatus(detail));
                }
            }
            body.get("results")
        }
        ProviderKind::OpenCage => {
            if let Some(code) = body.pointer("/status/code").and_then(Value::as_u64) {
                if code != 200 {
                    let message = body
                        .pointer("/status/message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error");
                    return Err(ProviderLookupError::ProviderStatus(format!("{} {}", code, message)));
                }
            }
            body.get("results")
        }
        ProviderKind::Nominatim => Some(body),
    };

    let list = candidates
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderLookupError::InvalidResponse("missing result list".into()))?;

    list.first()
        .ok_or_else(|| ProviderLookupError::NoResults(query.to_string()))
}

fn coordinates(kind: ProviderKind, candidate: &Value) -> Result<(f64, f64), ProviderLookupError> {
    let (lat, lon) = match kind {
        ProviderKind::Google => (
            candidate.pointer("/geometry/location/lat"),
            candidate.pointer("/geometry/location/lng"),
        ),
        ProviderKind::OpenCage => (
            candidate.pointer("/geometry/lat"),
            candidate.pointer("/geometry/lng"),
        ),
        ProviderKind::Nominatim => (candidate.get("lat"), candidate.get("lon")),
    };

    let lat = number(lat).ok_or_else(|| ProviderLookupError::InvalidResponse("no latitude".into()))?;
    let lon = number(lon).ok_or_else(|| ProviderLookupError::InvalidResponse("no longitude".into()))?;
    Ok((lat, lon))
}

/// Coordinates arrive as JSON numbers (Google, OpenCage) or strings (Nominatim).
fn number(v: Option<&Value>) -> Option<f64> {
    match v? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
