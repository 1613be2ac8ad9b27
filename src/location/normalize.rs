//! Extraction of administrative components from provider payloads.
//!
//! Providers disagree on response shape, so extraction looks at what the
//! payload actually carries:
//!
//! - `address_components`: a list of typed components (Google style).
//!   The `locality` entry is the city, the `country` entry the country.
//! - `components`: an object already keyed by semantic name (OpenCage style).
//! - `display_name`: one comma-separated string, most specific part first
//!   (Nominatim style). Country is the last part; city is the third-from-last
//!   part when there are more than two parts, otherwise the first part. This
//!   is a heuristic tuned to one provider's format and is known to pick a
//!   state or county on some addresses ("123 Main St, Austin, TX, United
//!   States" yields "TX"). Callers depend on this exact behaviour.
//!
//! A payload matching none of these yields no components. That is not an
//! error.

use super::types::Component;
use serde_json::Value;
use std::collections::BTreeMap;

/// Recognised payload shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    TypedComponents,
    KeyedComponents,
    DisplayName,
}

const DETECTION_ORDER: [PayloadShape; 3] = [
    PayloadShape::TypedComponents,
    PayloadShape::KeyedComponents,
    PayloadShape::DisplayName,
];

/// Detect the first recognised shape carried by `raw`.
pub fn detect_shape(raw: &Value) -> Option<PayloadShape> {
    DETECTION_ORDER.into_iter().find(|shape| carries(raw, *shape))
}

fn carries(raw: &Value, shape: PayloadShape) -> bool {
    match shape {
        PayloadShape::TypedComponents => raw.get("address_components").is_some_and(Value::is_array),
        PayloadShape::KeyedComponents => raw.get("components").is_some_and(Value::is_object),
        PayloadShape::DisplayName => raw.get("display_name").is_some_and(Value::is_string),
    }
}

/// Extract components, trying the shape the provider normally returns first
/// and falling back to whatever shape the payload actually carries.
pub fn extract(raw: &Value, expected: PayloadShape) -> BTreeMap<Component, String> {
    let shape = if carries(raw, expected) {
        Some(expected)
    } else {
        detect_shape(raw)
    };

    match shape {
        Some(PayloadShape::TypedComponents) => from_typed_components(raw),
        Some(PayloadShape::KeyedComponents) => from_keyed_components(raw),
        Some(PayloadShape::DisplayName) => from_display_name(raw),
        None => BTreeMap::new(),
    }
}

fn from_typed_components(raw: &Value) -> BTreeMap<Component, String> {
    let mut out = BTreeMap::new();
    let Some(list) = raw.get("address_components").and_then(Value::as_array) else {
        return out;
    };

    for entry in list {
        let types: Vec<&str> = entry
            .get("types")
            .and_then(Value::as_array)
            .map(|t| t.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let Some(name) = non_empty_str(entry.get("long_name")) else {
            continue;
        };

        if types.contains(&"locality") {
            out.insert(Component::City, name.to_string());
        } else if types.contains(&"country") {
            out.insert(Component::Country, name.to_string());
        }
    }
    out
}

fn from_keyed_components(raw: &Value) -> BTreeMap<Component, String> {
    let mut out = BTreeMap::new();
    let Some(map) = raw.get("components") else {
        return out;
    };

    if let Some(city) = non_empty_str(map.get("city")) {
        out.insert(Component::City, city.to_string());
    }
    if let Some(country) = non_empty_str(map.get("country")) {
        out.insert(Component::Country, country.to_string());
    }
    out
}

fn from_display_name(raw: &Value) -> BTreeMap<Component, String> {
    let mut out = BTreeMap::new();
    let Some(display) = raw.get("display_name").and_then(Value::as_str) else {
        return out;
    };

    let (city, country) = split_display_name(display);
    if let Some(city) = city.filter(|c| !c.is_empty()) {
        out.insert(Component::City, city.to_string());
    }
    if let Some(country) = country.filter(|c| !c.is_empty()) {
        out.insert(Component::Country, country.to_string());
    }
    out
}

/// Apply the display-string heuristic: `(city, country)`.
pub fn split_display_name(display: &str) -> (Option<&str>, Option<&str>) {
    let parts: Vec<&str> = display.split(", ").collect();
    if parts.len() < 2 {
        return (None, None);
    }

    let n = parts.len();
    let city = if n > 2 { parts[n - 3] } else { parts[0] };
    (Some(city), Some(parts[n - 1]))
}

fn non_empty_str(v: Option<&Value>) -> Option<&str> {
    v.and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}
