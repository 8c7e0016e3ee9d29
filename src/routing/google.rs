//! Google Directions API client

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::{Avoid, RoutingProvider};
use crate::config::RoutingConfig;
use crate::http;
use crate::models::{BoundingBox, Coordinate, RouteGeometry, RoutePoint};

pub struct GoogleDirections {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleDirections {
    pub fn new(settings: &RoutingConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(Duration::from_secs(settings.timeout_seconds), 1)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone().filter(|key| !key.is_empty()),
        })
    }

    fn url(&self, api_key: &str, origin: &str, destination: &str, avoid: Option<Avoid>) -> String {
        let mut url = format!(
            "{}/directions/json?origin={}&destination={}&mode=driving\
             &alternatives=true&departure_time=now&key={}",
            self.base_url,
            urlencoding::encode(origin),
            urlencoding::encode(destination),
            urlencoding::encode(api_key)
        );
        if let Some(avoid) = avoid {
            url.push_str("&avoid=");
            url.push_str(avoid.as_str());
        }
        url
    }

    async fn fetch(
        &self,
        api_key: &str,
        origin: &str,
        destination: &str,
        avoid: Option<Avoid>,
    ) -> Result<Vec<RouteGeometry>> {
        let response: DirectionsResponse = self
            .client
            .get(self.url(api_key, origin, destination, avoid))
            .send()
            .await
            .with_context(|| "Directions request failed")?
            .error_for_status()
            .with_context(|| "Directions API returned an error status")?
            .json()
            .await
            .with_context(|| "Failed to parse Directions response")?;

        response.into_geometries()
    }
}

#[async_trait]
impl RoutingProvider for GoogleDirections {
    #[instrument(name = "directions", skip(self))]
    async fn routes(
        &self,
        origin: &str,
        destination: &str,
        avoid: Option<Avoid>,
    ) -> Vec<RouteGeometry> {
        let Some(api_key) = &self.api_key else {
            warn!("No routing API key configured, returning no routes");
            return Vec::new();
        };

        match self.fetch(api_key, origin, destination, avoid).await {
            Ok(routes) => {
                debug!("Directions returned {} routes", routes.len());
                routes
            }
            Err(e) => {
                warn!("Routing provider failed: {e:#}");
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

impl DirectionsResponse {
    fn into_geometries(self) -> Result<Vec<RouteGeometry>> {
        match self.status.as_str() {
            "OK" => Ok(self.routes.into_iter().map(DirectionsRoute::into_geometry).collect()),
            "ZERO_RESULTS" | "NOT_FOUND" => {
                info!("Directions found no route ({})", self.status);
                Ok(Vec::new())
            }
            status => bail!(
                "Directions status {status}: {}",
                self.error_message.unwrap_or_default()
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    summary: String,
    bounds: Option<BoundingBox>,
    overview_polyline: Option<EncodedPolyline>,
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct EncodedPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct Leg {
    distance: TextValue,
    duration: TextValue,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    value: u64,
}

#[derive(Debug, Deserialize)]
struct Step {
    start_location: Coordinate,
    end_location: Coordinate,
}

impl DirectionsRoute {
    fn into_geometry(self) -> RouteGeometry {
        let mut coordinates: Vec<Coordinate> = Vec::new();
        for step in self.legs.iter().flat_map(|leg| &leg.steps) {
            for location in [step.start_location, step.end_location] {
                if coordinates.last() != Some(&location) {
                    coordinates.push(location);
                }
            }
        }

        let (distance_text, duration_text) = match self.legs.as_slice() {
            [leg] => (leg.distance.text.clone(), leg.duration.text.clone()),
            legs => (
                legs.iter().map(|l| l.distance.text.as_str()).collect::<Vec<_>>().join(" + "),
                legs.iter().map(|l| l.duration.text.as_str()).collect::<Vec<_>>().join(" + "),
            ),
        };

        RouteGeometry {
            points: RoutePoint::sequence(coordinates),
            summary: self.summary,
            distance_text,
            duration_text,
            distance_meters: self.legs.iter().map(|l| l.distance.value).sum(),
            duration_seconds: self.legs.iter().map(|l| l.duration.value).sum(),
            bounds: self.bounds,
            polyline: self.overview_polyline.map(|p| p.points).unwrap_or_default(),
        }
    }
}
