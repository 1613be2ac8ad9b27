//! Request and result types for ranking checks.

use crate::location::{LocationQuery, ResolvedLocation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const MIN_DEPTH: u32 = 1;
pub const MAX_DEPTH: u32 = 100;

/// Device the SERP is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Desktop,
    Mobile,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Device {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "mobile" => Ok(Self::Mobile),
            other => Err(ValidationError::UnknownDevice(other.to_string())),
        }
    }
}

/// Defaults applied to fields a caller leaves out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDefaults {
    pub language_code: String,
    pub device: Device,
    pub depth: u32,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            language_code: "en".into(),
            device: Device::Desktop,
            depth: 40,
        }
    }
}

/// Ranking check as submitted over HTTP.
#[derive(Debug, Clone, Deserialize)]
pub struct RankingRequestBody {
    pub keyword: String,
    pub location: LocationQuery,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub device: Option<Device>,
    #[serde(default)]
    pub depth: Option<u32>,
}

/// A validated ranking check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingRequest {
    pub keyword: String,
    pub location: LocationQuery,
    pub language_code: String,
    pub device: Device,
    pub depth: u32,
}

impl RankingRequest {
    /// Validate a request body, filling omitted fields from `defaults`.
    pub fn from_body(body: RankingRequestBody, defaults: &RequestDefaults) -> Result<Self, ValidationError> {
        let keyword = body.keyword.trim().to_string();
        if keyword.is_empty() {
            return Err(ValidationError::EmptyKeyword);
        }
        if body.location.address.trim().is_empty() {
            return Err(ValidationError::EmptyAddress);
        }

        let depth = body.depth.unwrap_or(defaults.depth);
        if !(MIN_DEPTH..=MAX_DEPTH).contains(&depth) {
            return Err(ValidationError::DepthOutOfRange(depth));
        }

        let language_code = body
            .language_code
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| defaults.language_code.clone());

        Ok(Self {
            keyword,
            location: body.location,
            language_code,
            device: body.device.unwrap_or(defaults.device),
            depth,
        })
    }
}

/// Input errors on a ranking check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Keyword cannot be empty")]
    EmptyKeyword,
    #[error("Location address cannot be empty")]
    EmptyAddress,
    #[error("Depth must be between 1 and 100, got {0}")]
    DepthOutOfRange(u32),
    #[error("Unknown device '{0}'. Use 'desktop' or 'mobile'.")]
    UnknownDevice(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganicResult {
    pub position: Option<u32>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub domain: Option<String>,
    pub breadcrumb: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapResult {
    pub position: Option<u32>,
    pub title: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub reviews_count: Option<u64>,
    pub category: Option<String>,
}

/// Merged response for one ranking check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingResults {
    pub keyword: String,
    pub location: ResolvedLocation,
    pub device: Device,
    pub language_code: String,
    pub depth: u32,
    pub organic_results: Vec<OrganicResult>,
    pub maps_results: Vec<MapResult>,
    pub check_date: DateTime<Utc>,
    pub processing_time_seconds: f64,
}

/// Result of one downstream fetch: items, or a marker that it failed.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Items(Vec<T>),
    Failed(String),
}

impl<T> FetchOutcome<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Failed fetches degrade to an empty list.
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Items(items) => items,
            Self::Failed(_) => Vec::new(),
        }
    }
}
