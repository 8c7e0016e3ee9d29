//! Driving route providers

use async_trait::async_trait;

use crate::models::RouteGeometry;

pub mod google;

pub use google::GoogleDirections;

/// Road class the provider should steer around
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Avoid {
    Highways,
    Tolls,
}

impl Avoid {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Avoid::Highways => "highways",
            Avoid::Tolls => "tolls",
        }
    }
}

/// Source of route geometries between two free-text places
///
/// Implementations swallow provider failures and return an empty list.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn routes(
        &self,
        origin: &str,
        destination: &str,
        avoid: Option<Avoid>,
    ) -> Vec<RouteGeometry>;
}
