//! Route planning pipeline
//!
//! Fetches base routes, expands them into road-type variants, assesses every
//! variant concurrently and selects the routes suited to the driver.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::Result;
use crate::aggregator::RiskAggregator;
use crate::cache::{WeatherCache, expand_home};
use crate::config::{IcyRouteConfig, SamplingConfig, WeatherProviderKind};
use crate::error::IcyRouteError;
use crate::events::{EventNote, WinterEventCatalog};
use crate::models::{
    DriverExperience, ObservationSource, RouteAssessment, RouteGeometry, TemporalMode,
};
use crate::ranking::{self, RouteReport};
use crate::risk::IceRiskModel;
use crate::routing::{Avoid, GoogleDirections, RoutingProvider};
use crate::variants::VariantGenerator;
use crate::weather::WeatherAdapter;

/// Route planning request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteRequest {
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub driver_experience: DriverExperience,
    #[serde(default)]
    pub avoid_icy: bool,
}

/// Which weather data the assessment was based on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherSourceLabel {
    Historical,
    Current,
    Simulated,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteResponse {
    pub routes: Vec<RouteReport>,
    pub driver_experience: DriverExperience,
    pub timestamp: DateTime<Utc>,
    pub weather_source: WeatherSourceLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winter_event: Option<EventNote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub policy_version: String,
}

pub struct RoutePlanner {
    routing: Arc<dyn RoutingProvider>,
    generator: VariantGenerator,
    aggregator: RiskAggregator,
    events: WinterEventCatalog,
    sampling: SamplingConfig,
    distinct_geometries: bool,
}

impl RoutePlanner {
    pub fn new(
        routing: Arc<dyn RoutingProvider>,
        weather: Arc<WeatherAdapter>,
        config: &IcyRouteConfig,
    ) -> Self {
        Self {
            routing,
            generator: VariantGenerator::new(config.routing.max_alternatives),
            aggregator: RiskAggregator::new(weather, IceRiskModel::default()),
            events: WinterEventCatalog::builtin(),
            sampling: config.sampling.clone(),
            distinct_geometries: config.routing.distinct_geometries,
        }
    }

    /// Wire up the configured providers
    ///
    /// The on-disk cache is only opened for live weather; failing to open it is
    /// logged and the planner runs uncached.
    pub fn from_config(config: &IcyRouteConfig) -> anyhow::Result<Self> {
        let live = config.weather.provider == WeatherProviderKind::Live;
        let cache = if config.cache.enabled && live {
            let location = expand_home(&config.cache.location);
            WeatherCache::open(&location)
                .inspect_err(|e| {
                    warn!("Running without weather cache at {}: {e:#}", location.display());
                })
                .ok()
        } else {
            None
        };

        let weather = WeatherAdapter::from_config(config, cache)?;
        let routing = GoogleDirections::new(&config.routing)?;
        Ok(Self::new(Arc::new(routing), Arc::new(weather), config))
    }

    #[must_use]
    pub fn events(&self) -> &WinterEventCatalog {
        &self.events
    }

    #[instrument(
        name = "plan_routes",
        skip_all,
        fields(origin = %request.origin, destination = %request.destination)
    )]
    pub async fn plan(&self, request: &RouteRequest) -> Result<RouteResponse> {
        let origin = request.origin.trim();
        let destination = request.destination.trim();
        if origin.is_empty() || destination.is_empty() {
            return Err(IcyRouteError::validation("Origin and destination are required"));
        }

        let event = self.events.find(origin, destination);
        let (mode, interval_km) = match event {
            Some(event) => {
                info!("Matched winter event '{}'", event.name());
                (TemporalMode::Historical(event.window()), self.sampling.fine_interval_km)
            }
            None => (TemporalMode::Current, self.sampling.coarse_interval_km),
        };

        let mut geometries = self.fetch_geometries(origin, destination).await;
        geometries.retain(|geometry| {
            if geometry.points.is_empty() {
                warn!("Dropping route '{}' without points", geometry.summary);
                return false;
            }
            true
        });
        let variants = self.generator.variants(&geometries);

        let assessments: Vec<RouteAssessment> = join_all(variants.values().map(|variant| {
            let context = format!("{} {}", variant.name, variant.geometry.summary);
            let mode = &mode;
            async move {
                self.aggregator
                    .assess(variant, &context, mode, interval_km * 1000.0)
                    .await
            }
        }))
        .await;

        let weather_source = weather_source(&assessments, &mode);
        let status = assessments
            .is_empty()
            .then(|| format!("No routes found between {origin} and {destination}"));

        let routes: Vec<RouteReport> =
            ranking::select(assessments, request.driver_experience, request.avoid_icy)
                .into_iter()
                .map(|assessment| RouteReport::new(assessment, request.driver_experience))
                .collect();

        info!(
            "Planned {} routes from {} variants ({:?} weather)",
            routes.len(),
            variants.len(),
            weather_source
        );

        Ok(RouteResponse {
            routes,
            driver_experience: request.driver_experience,
            timestamp: Utc::now(),
            weather_source,
            winter_event: event.map(|event| event.note()),
            status,
            policy_version: self.aggregator.model().policy().version.to_string(),
        })
    }

    /// Base routes, plus highway- and toll-avoiding alternatives when enabled
    async fn fetch_geometries(&self, origin: &str, destination: &str) -> Vec<RouteGeometry> {
        if !self.distinct_geometries {
            return self.routing.routes(origin, destination, None).await;
        }

        let (base, avoid_highways, avoid_tolls) = futures::join!(
            self.routing.routes(origin, destination, None),
            self.routing.routes(origin, destination, Some(Avoid::Highways)),
            self.routing.routes(origin, destination, Some(Avoid::Tolls)),
        );

        // primary route first, then one of each avoiding kind, so the base cap keeps them
        let mut base = base.into_iter();
        base.next()
            .into_iter()
            .chain(avoid_highways.into_iter().take(1))
            .chain(avoid_tolls.into_iter().take(1))
            .chain(base)
            .collect()
    }
}

fn weather_source(assessments: &[RouteAssessment], mode: &TemporalMode) -> WeatherSourceLabel {
    let mut samples = assessments.iter().flat_map(|a| &a.samples).peekable();
    let simulated = samples.peek().is_some()
        && samples.all(|s| s.weather.source == ObservationSource::Simulated);

    match mode {
        _ if simulated => WeatherSourceLabel::Simulated,
        TemporalMode::Historical(_) => WeatherSourceLabel::Historical,
        TemporalMode::Current => WeatherSourceLabel::Current,
    }
}
