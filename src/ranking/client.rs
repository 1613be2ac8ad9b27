//! DataForSEO client for organic and Google Maps SERP data.

use super::types::{MapResult, OrganicResult, RankingRequest};
use crate::location::ResolvedLocation;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;
use tracing::error;

const ORGANIC_PATH: &str = "/serp/google/organic/live/advanced";
const MAPS_PATH: &str = "/serp/google/maps/live/advanced";

/// DataForSEO's success code, both top-level and per task.
const STATUS_OK: u32 = 20000;

/// The maps endpoint returns fewer results than organic.
const MAPS_MAX_DEPTH: u32 = 40;

/// Map zoom used in `location_coordinate`.
const COORDINATE_ZOOM: u32 = 17;

/// A single downstream fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankingError {
    #[error("network error: {0}")]
    Network(String),
    #[error("DataForSEO API error: HTTP {0}")]
    Status(u16),
    #[error("task failed ({code}): {message}")]
    TaskFailed { code: u32, message: String },
    #[error("no tasks returned")]
    NoTasks,
    #[error("invalid response: {0}")]
    Parse(String),
    #[error("fetch task failed: {0}")]
    Task(String),
}

impl From<ureq::Error> for RankingError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => Self::Status(code),
            ureq::Error::Transport(t) => Self::Network(t.to_string()),
        }
    }
}

/// Source of SERP data. Calls block; callers move them off the runtime.
pub trait RankingSource: Send + Sync + Debug {
    fn organic(
        &self,
        request: &RankingRequest,
        location: &ResolvedLocation,
    ) -> Result<Vec<OrganicResult>, RankingError>;

    fn maps(
        &self,
        request: &RankingRequest,
        location: &ResolvedLocation,
    ) -> Result<Vec<MapResult>, RankingError>;

    /// True when the API accepts our credentials and answers a trivial task.
    fn test_connection(&self) -> bool;

    /// Base URL reported on the status surface.
    fn base_url(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct DataForSeoClient {
    agent: ureq::Agent,
    base_url: String,
    authorization: String,
}

impl DataForSeoClient {
    pub fn new(base_url: impl Into<String>, login: &str, password: &str, agent: ureq::Agent) -> Self {
        let token = base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", login, password));
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            authorization: format!("Basic {}", token),
        }
    }

    fn post<T: Serialize>(&self, path: &str, task: &T) -> Result<ApiResponse, RankingError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .agent
            .post(&url)
            .set("Authorization", &self.authorization)
            .set("Content-Type", "application/json")
            .send_json([task])?;

        response
            .into_json()
            .map_err(|e| RankingError::Parse(e.to_string()))
    }
}

impl RankingSource for DataForSeoClient {
    fn organic(
        &self,
        request: &RankingRequest,
        location: &ResolvedLocation,
    ) -> Result<Vec<OrganicResult>, RankingError> {
        let task = SerpTask {
            keyword: &request.keyword,
            location_coordinate: location_coordinate(location),
            language_name: language_name(&request.language_code),
            device: request.device.as_str(),
            depth: request.depth,
            calculate_rectangles: Some(false),
            include_serp_info: Some(true),
        };
        let response = self.post(ORGANIC_PATH, &task)?;
        parse_organic(response, request.depth)
    }

    fn maps(
        &self,
        request: &RankingRequest,
        location: &ResolvedLocation,
    ) -> Result<Vec<MapResult>, RankingError> {
        let task = SerpTask {
            keyword: &request.keyword,
            location_coordinate: location_coordinate(location),
            language_name: language_name(&request.language_code),
            device: request.device.as_str(),
            depth: request.depth.min(MAPS_MAX_DEPTH),
            calculate_rectangles: None,
            include_serp_info: None,
        };
        let response = self.post(MAPS_PATH, &task)?;
        parse_maps(response, request.depth)
    }

    fn test_connection(&self) -> bool {
        let task = ConnectionTestTask {
            keyword: "test",
            location_name: "United States",
            language_name: "English",
            device: "desktop",
            depth: 1,
        };
        match self.post(ORGANIC_PATH, &task) {
            Ok(response) => response.status_code == Some(STATUS_OK),
            Err(e) => {
                error!(error = %e, "DataForSEO connection test failed");
                false
            }
        }
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

// ─── Wire types ──────────────────────────────────────────────────

#[derive(Serialize)]
struct SerpTask<'a> {
    keyword: &'a str,
    location_coordinate: String,
    language_name: &'static str,
    device: &'static str,
    depth: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    calculate_rectangles: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_serp_info: Option<bool>,
}

#[derive(Serialize)]
struct ConnectionTestTask {
    keyword: &'static str,
    location_name: &'static str,
    language_name: &'static str,
    device: &'static str,
    depth: u32,
}

#[derive(Deserialize, Debug, Default)]
pub struct ApiResponse {
    #[serde(default)]
    pub status_code: Option<u32>,
    #[serde(default)]
    pub tasks: Option<Vec<ApiTask>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ApiTask {
    #[serde(default)]
    pub status_code: Option<u32>,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub result: Option<Vec<TaskResult>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct TaskResult {
    #[serde(default)]
    pub items: Option<Vec<SerpItem>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct SerpItem {
    #[serde(default, rename = "type")]
    pub item_type: Option<String>,
    #[serde(default)]
    pub rank_group: Option<u32>,
    #[serde(default)]
    pub rank_absolute: Option<u32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub breadcrumb: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub rating: Option<SerpRating>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct SerpRating {
    #[serde(default)]
    pub rating_value: Option<f64>,
    #[serde(default)]
    pub votes_count: Option<u64>,
}

impl SerpItem {
    fn position(&self) -> Option<u32> {
        self.rank_group.or(self.rank_absolute)
    }

    fn is_type(&self, types: &[&str]) -> bool {
        self.item_type.as_deref().is_some_and(|t| types.contains(&t))
    }
}

// ─── Parsing ─────────────────────────────────────────────────────

/// Pull the item list out of the first task, checking its status.
fn task_items(response: ApiResponse) -> Result<Vec<SerpItem>, RankingError> {
    let task = response
        .tasks
        .and_then(|t| t.into_iter().next())
        .ok_or(RankingError::NoTasks)?;

    let code = task.status_code.unwrap_or_default();
    if code != STATUS_OK {
        return Err(RankingError::TaskFailed {
            code,
            message: task.status_message.unwrap_or_else(|| "unknown".into()),
        });
    }

    Ok(task
        .result
        .and_then(|r| r.into_iter().next())
        .and_then(|r| r.items)
        .unwrap_or_default())
}

pub fn parse_organic(response: ApiResponse, depth: u32) -> Result<Vec<OrganicResult>, RankingError> {
    let items = task_items(response)?;
    Ok(items
        .into_iter()
        .filter(|item| item.is_type(&["organic"]))
        .map(|item| OrganicResult {
            position: item.position(),
            title: item.title,
            description: item.description,
            url: item.url,
            domain: item.domain,
            breadcrumb: item.breadcrumb,
        })
        .take(depth as usize)
        .collect())
}

pub fn parse_maps(response: ApiResponse, depth: u32) -> Result<Vec<MapResult>, RankingError> {
    let items = task_items(response)?;
    Ok(items
        .into_iter()
        .filter(|item| item.is_type(&["maps_paid", "local_pack", "maps_search"]))
        .map(|item| {
            let position = item.position();
            let (rating, reviews_count) = match item.rating {
                Some(r) => (r.rating_value, r.votes_count),
                None => (None, None),
            };
            MapResult {
                position,
                title: item.title,
                address: item.address,
                phone: item.phone,
                website: item.url,
                rating,
                reviews_count,
                category: item.category,
            }
        })
        .take(depth as usize)
        .collect())
}

fn location_coordinate(location: &ResolvedLocation) -> String {
    format!("{},{},{}", location.latitude, location.longitude, COORDINATE_ZOOM)
}

/// Map an ISO language code to the name DataForSEO expects.
pub fn language_name(code: &str) -> &'static str {
    match code.trim().to_lowercase().as_str() {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        _ => "English",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationQuery;
    use crate::ranking::types::Device;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    const AUTH: &str = "Basic bG9naW46cHc=";

    fn response(value: serde_json::Value) -> ApiResponse {
        serde_json::from_value(value).unwrap()
    }

    fn ok_with_items(items: serde_json::Value) -> ApiResponse {
        response(json!({
            "status_code": 20000,
            "tasks": [{
                "status_code": 20000,
                "status_message": "Ok.",
                "result": [{ "items": items }]
            }]
        }))
    }

    #[test]
    fn test_parse_organic_filters_and_ranks() {
        let resp = ok_with_items(json!([
            { "type": "featured_snippet", "rank_group": 1, "title": "Snippet" },
            { "type": "organic", "rank_group": 1, "rank_absolute": 2, "title": "First",
              "url": "https://a.example/", "domain": "a.example", "description": "A" },
            { "type": "organic", "rank_absolute": 5, "title": "Second", "domain": "b.example" },
            { "type": "organic", "rank_group": 3, "title": "Third" }
        ]));
        let results = parse_organic(resp, 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].position, Some(1));
        assert_eq!(results[0].domain.as_deref(), Some("a.example"));
        assert_eq!(results[1].position, Some(5));
        assert_eq!(results[1].title.as_deref(), Some("Second"));
    }

    #[test]
    fn test_parse_maps_rating_and_website() {
        let resp = ok_with_items(json!([
            { "type": "maps_search", "rank_group": 1, "title": "Joe's Pizza",
              "address": "7 Carmine St", "phone": "+1 212-366-1182",
              "url": "https://joespizzanyc.com/", "category": "Pizza restaurant",
              "rating": { "rating_value": 4.5, "votes_count": 10234 } },
            { "type": "maps_paid", "rank_group": 2, "title": "Ad Pizza" },
            { "type": "organic", "rank_group": 3, "title": "ignored" }
        ]));
        let results = parse_maps(resp, 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].website.as_deref(), Some("https://joespizzanyc.com/"));
        assert_eq!(results[0].rating, Some(4.5));
        assert_eq!(results[0].reviews_count, Some(10234));
        assert_eq!(results[1].rating, None);
    }

    #[test]
    fn test_task_failure_is_error() {
        let resp = response(json!({
            "status_code": 20000,
            "tasks": [{ "status_code": 40501, "status_message": "Invalid Field: 'depth'." }]
        }));
        let err = parse_organic(resp, 10).unwrap_err();
        assert_eq!(
            err,
            RankingError::TaskFailed { code: 40501, message: "Invalid Field: 'depth'.".into() }
        );
    }

    #[test]
    fn test_no_tasks_is_error() {
        assert_eq!(parse_maps(response(json!({ "tasks": [] })), 10).unwrap_err(), RankingError::NoTasks);
        assert_eq!(parse_maps(response(json!({})), 10).unwrap_err(), RankingError::NoTasks);
    }

    #[test]
    fn test_null_result_is_empty() {
        let resp = response(json!({
            "tasks": [{ "status_code": 20000, "result": null }]
        }));
        assert!(parse_organic(resp, 10).unwrap().is_empty());
    }

    #[test]
    fn test_language_name() {
        assert_eq!(language_name("en"), "English");
        assert_eq!(language_name("DE"), "German");
        assert_eq!(language_name("zh"), "Chinese");
        assert_eq!(language_name("xx"), "English");
    }

    #[test]
    fn test_location_coordinate() {
        let loc = ResolvedLocation {
            address: "x".into(),
            pincode: None,
            latitude: 40.7128,
            longitude: -74.006,
            city: None,
            country: None,
        };
        assert_eq!(location_coordinate(&loc), "40.7128,-74.006,17");
    }

    #[test]
    fn test_client_trims_base_url() {
        let agent = ureq::AgentBuilder::new().build();
        let client = DataForSeoClient::new("https://sandbox.dataforseo.com/v3/", "login", "pw", agent);
        assert_eq!(client.base_url(), "https://sandbox.dataforseo.com/v3");
        assert_eq!(client.authorization, "Basic bG9naW46cHc=");
    }

    fn client(server: &MockServer, timeout: Duration) -> DataForSeoClient {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        DataForSeoClient::new(server.url("/v3"), "login", "pw", agent)
    }

    fn chicago() -> ResolvedLocation {
        ResolvedLocation {
            address: "Chicago, IL".into(),
            pincode: None,
            latitude: 41.8781,
            longitude: -87.6298,
            city: Some("Chicago".into()),
            country: None,
        }
    }

    fn pizza(depth: u32) -> RankingRequest {
        RankingRequest {
            keyword: "pizza".into(),
            location: LocationQuery::new("Chicago, IL"),
            language_code: "en".into(),
            device: Device::Desktop,
            depth,
        }
    }

    #[test]
    fn test_organic_request_shape() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v3/serp/google/organic/live/advanced")
                .header("Authorization", AUTH)
                .header("Content-Type", "application/json")
                .json_body(json!([{
                    "keyword": "pizza",
                    "location_coordinate": "41.8781,-87.6298,17",
                    "language_name": "English",
                    "device": "desktop",
                    "depth": 10,
                    "calculate_rectangles": false,
                    "include_serp_info": true
                }]));
            then.status(200).json_body(json!({
                "status_code": 20000,
                "tasks": [{
                    "status_code": 20000,
                    "result": [{ "items": [
                        { "type": "organic", "rank_group": 1, "title": "Lou Malnati's" }
                    ] }]
                }]
            }));
        });

        let results = client(&server, Duration::from_secs(5)).organic(&pizza(10), &chicago()).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title.as_deref(), Some("Lou Malnati's"));
        mock.assert();
    }

    #[test]
    fn test_maps_request_caps_depth() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v3/serp/google/maps/live/advanced")
                .header("Authorization", AUTH)
                .json_body(json!([{
                    "keyword": "pizza",
                    "location_coordinate": "41.8781,-87.6298,17",
                    "language_name": "English",
                    "device": "desktop",
                    "depth": 40
                }]));
            then.status(200).json_body(json!({
                "status_code": 20000,
                "tasks": [{ "status_code": 20000, "result": [{ "items": [] }] }]
            }));
        });

        let results = client(&server, Duration::from_secs(5)).maps(&pizza(80), &chicago()).unwrap();

        assert!(results.is_empty());
        mock.assert();
    }

    #[test]
    fn test_http_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.path("/v3/serp/google/organic/live/advanced");
            then.status(401).json_body(json!({ "status_code": 40100 }));
        });

        let err = client(&server, Duration::from_secs(5)).organic(&pizza(10), &chicago()).unwrap_err();
        assert_eq!(err, RankingError::Status(401));
    }

    #[test]
    fn test_timeout_is_network_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.path("/v3/serp/google/maps/live/advanced");
            then.status(200).delay(Duration::from_secs(2)).json_body(json!({ "status_code": 20000 }));
        });

        let err = client(&server, Duration::from_millis(200)).maps(&pizza(10), &chicago()).unwrap_err();
        assert!(matches!(err, RankingError::Network(_)));
    }

    #[test]
    fn test_connection_ok() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v3/serp/google/organic/live/advanced")
                .header("Authorization", AUTH)
                .json_body(json!([{
                    "keyword": "test",
                    "location_name": "United States",
                    "language_name": "English",
                    "device": "desktop",
                    "depth": 1
                }]));
            then.status(200).json_body(json!({ "status_code": 20000, "tasks": [] }));
        });

        assert!(client(&server, Duration::from_secs(5)).test_connection());
        mock.assert();
    }

    #[test]
    fn test_connection_rejects_api_error_code() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.path("/v3/serp/google/organic/live/advanced");
            then.status(200).json_body(json!({ "status_code": 40200, "status_message": "Payment Required." }));
        });

        assert!(!client(&server, Duration::from_secs(5)).test_connection());
    }

    #[test]
    fn test_connection_rejects_http_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.path("/v3/serp/google/organic/live/advanced");
            then.status(401);
        });

        assert!(!client(&server, Duration::from_secs(5)).test_connection());
    }
}
