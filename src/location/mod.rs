//! Location subsystem for the rank tracker.
//!
//! Resolves a structured location to coordinates through an ordered chain
//! of geocoding providers, normalizing each provider's response shape.

pub mod chain;
pub mod normalize;
pub mod providers;
pub mod resolver;
pub mod types;

pub use chain::{GeocodingCredentials, ProviderChain};
pub use providers::{http_agent, Geocoder};
pub use resolver::LocationResolver;
pub use types::{
    GeocodingStatus, HealthState, LocationQuery, ProviderKind, ResolutionError, ResolvedLocation,
    SlotRole,
};
