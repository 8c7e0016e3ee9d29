//! Data models for the IcyRoute service
//!
//! This module contains the core domain models organized by concern:
//! - Location: Coordinates, route points and bounding boxes
//! - Weather: Observations and query modes
//! - Route: Provider geometries and road-type variants
//! - Assessment: Per-sample risk and route-level statistics

pub mod assessment;
pub mod location;
pub mod route;
pub mod weather;

// Re-export all public types for convenient access
pub use assessment::{DriverExperience, RiskLevel, RouteAssessment, WeatherSample};
pub use location::{BoundingBox, Coordinate, RoutePoint};
pub use route::{RoadType, RouteGeometry, RouteVariant};
pub use weather::{HistoricalWindow, ObservationSource, TemporalMode, WeatherObservation};
