//! `IcyRoute` - Winter route planning with ice risk assessment
//!
//! This library samples candidate driving routes, scores the ice risk at each
//! sampled point from live, archived or simulated weather, and ranks the routes
//! for a driver's experience level.

pub mod aggregator;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod http;
pub mod logging;
pub mod models;
pub mod planner;
pub mod ranking;
pub mod risk;
pub mod routing;
pub mod sampler;
pub mod variants;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use aggregator::RiskAggregator;
pub use api::AppState;
pub use cache::WeatherCache;
pub use config::IcyRouteConfig;
pub use error::IcyRouteError;
pub use events::WinterEventCatalog;
pub use models::{Coordinate, DriverExperience, RouteAssessment, RouteGeometry, WeatherObservation};
pub use planner::{RoutePlanner, RouteRequest, RouteResponse};
pub use risk::{IceRiskModel, RiskPolicy};
pub use routing::RoutingProvider;
pub use weather::{WeatherAdapter, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, IcyRouteError>;
