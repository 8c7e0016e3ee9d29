//! Route risk aggregation
//!
//! Samples a variant's geometry, observes the weather at every sampled point
//! concurrently and scores each point. All observations are awaited before the
//! route statistics are computed.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, instrument};

use crate::models::{
    RoadType, RouteAssessment, RoutePoint, RouteVariant, TemporalMode, WeatherSample,
};
use crate::risk::IceRiskModel;
use crate::sampler;
use crate::weather::WeatherAdapter;

/// Share of the route at each end that counts as approach road
const APPROACH_SHARE: f64 = 0.2;

pub struct RiskAggregator {
    weather: Arc<WeatherAdapter>,
    model: IceRiskModel,
}

impl RiskAggregator {
    pub fn new(weather: Arc<WeatherAdapter>, model: IceRiskModel) -> Self {
        Self { weather, model }
    }

    pub fn model(&self) -> &IceRiskModel {
        &self.model
    }

    /// Assess one variant
    ///
    /// `context` is free text describing the route (name, summary) scanned for
    /// road keywords.
    #[instrument(skip_all, fields(route = %variant.name))]
    pub async fn assess(
        &self,
        variant: &RouteVariant,
        context: &str,
        mode: &TemporalMode,
        interval_m: f64,
    ) -> RouteAssessment {
        let points = sampler::sample(&variant.geometry.points, interval_m);
        let total = points.len();

        let samples = join_all(
            points.iter().enumerate().map(|(position, point)| {
                let road_type = segment_road_type(variant.road_type, position, total);
                self.score_point(*point, road_type, context, mode)
            }),
        )
        .await;

        let threshold = self.model.policy().high_risk_threshold;
        let assessment = RouteAssessment::from_samples(variant, samples, threshold);
        debug!(
            "Assessed {} samples: avg {:.2}, max {:.2}",
            assessment.samples.len(),
            assessment.average_risk,
            assessment.max_risk
        );
        assessment
    }

    async fn score_point(
        &self,
        point: RoutePoint,
        road_type: RoadType,
        context: &str,
        mode: &TemporalMode,
    ) -> WeatherSample {
        let weather = self.weather.observe(&point.coordinate, mode).await;
        let risk = self.model.risk(&weather, &point.coordinate, road_type, context);

        WeatherSample {
            location: point,
            near_bridge: self.model.is_near_bridge(&point.coordinate),
            weather,
            risk,
            road_type,
        }
    }
}

/// Road type assumed at a sampled position
///
/// The approach at either end of a route runs on better-maintained roads than
/// the label suggests. In the middle the label applies, except that a highway
/// label is scored as arterial to reflect interchanges and connectors.
#[must_use]
pub fn segment_road_type(label: RoadType, position: usize, total: usize) -> RoadType {
    let progress = position as f64 / total.saturating_sub(1).max(1) as f64;

    if progress < APPROACH_SHARE || progress > 1.0 - APPROACH_SHARE {
        label.better_maintained()
    } else if label == RoadType::Highway {
        RoadType::Arterial
    } else {
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, ObservationSource, RouteGeometry, WeatherObservation};
    use crate::weather::{SimulatedWeather, WeatherProvider};
    use anyhow::Result;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::time::Duration;

    struct Fixed;

    #[async_trait]
    impl WeatherProvider for Fixed {
        fn source(&self) -> ObservationSource {
            ObservationSource::Live
        }

        async fn observe(&self, _: &Coordinate, _: &TemporalMode) -> Result<WeatherObservation> {
            Ok(WeatherObservation {
                temperature: -1.0,
                humidity: 90.0,
                precipitation: 1.0,
                snowfall: None,
                wind_speed: 30.0,
                description: "freezing rain".to_string(),
                source: ObservationSource::Live,
            })
        }
    }

    fn aggregator() -> RiskAggregator {
        let fixed: Arc<dyn WeatherProvider> = Arc::new(Fixed);
        let weather = WeatherAdapter::new(
            fixed.clone(),
            fixed,
            Arc::new(SimulatedWeather::new(Some(1))),
            Duration::from_secs(1),
        );
        RiskAggregator::new(Arc::new(weather), IceRiskModel::default())
    }

    fn variant(road_type: RoadType) -> RouteVariant {
        // roughly 150 km due north
        let points = RoutePoint::sequence(
            (0..=30).map(|i| Coordinate::new(38.0 + f64::from(i) * 0.045, -100.0)),
        );
        RouteVariant {
            name: road_type.route_title().to_string(),
            road_type,
            geometry: RouteGeometry {
                points,
                summary: "US-83".to_string(),
                distance_text: "94 mi".to_string(),
                duration_text: "1 hour 30 mins".to_string(),
                distance_meters: 150_000,
                duration_seconds: 5_400,
                bounds: None,
                polyline: "xyz".to_string(),
            },
        }
    }

    #[rstest]
    #[case(RoadType::Highway, 0, 5, RoadType::Highway)]
    #[case(RoadType::Highway, 2, 5, RoadType::Arterial)]
    #[case(RoadType::Local, 0, 5, RoadType::Arterial)]
    #[case(RoadType::Local, 2, 5, RoadType::Local)]
    #[case(RoadType::Scenic, 4, 5, RoadType::Local)]
    #[case(RoadType::Arterial, 0, 1, RoadType::Highway)]
    fn test_segment_road_type(
        #[case] label: RoadType,
        #[case] position: usize,
        #[case] total: usize,
        #[case] expected: RoadType,
    ) {
        assert_eq!(segment_road_type(label, position, total), expected);
    }

    #[tokio::test]
    async fn test_assessment_is_reproducible_with_fixed_weather() {
        let aggregator = aggregator();
        let variant = variant(RoadType::Local);

        let first = aggregator
            .assess(&variant, &variant.geometry.summary, &TemporalMode::Current, 50_000.0)
            .await;
        let second = aggregator
            .assess(&variant, &variant.geometry.summary, &TemporalMode::Current, 50_000.0)
            .await;

        assert_eq!(first, second);
        assert!(first.samples.len() >= 2);
        assert!(first.samples.windows(2).all(|w| w[0].location.index < w[1].location.index));
        assert!(first.samples.iter().all(|s| s.weather.source == ObservationSource::Live));
    }

    #[tokio::test]
    async fn test_statistics_match_samples() {
        let assessment = aggregator()
            .assess(&variant(RoadType::Local), "US-83", &TemporalMode::Current, 25_000.0)
            .await;

        let risks: Vec<f64> = assessment.samples.iter().map(|s| s.risk).collect();
        let mean = risks.iter().sum::<f64>() / risks.len() as f64;
        assert!((assessment.average_risk - mean).abs() < 1e-12);
        assert_eq!(assessment.max_risk, risks.iter().copied().fold(f64::MIN, f64::max));
        assert!(assessment.max_risk <= 1.0);
    }

    #[tokio::test]
    async fn test_highway_route_middle_is_scored_as_arterial() {
        let assessment = aggregator()
            .assess(&variant(RoadType::Highway), "", &TemporalMode::Current, 25_000.0)
            .await;

        let first = assessment.samples.first().unwrap();
        let middle = &assessment.samples[assessment.samples.len() / 2];
        assert_eq!(first.road_type, RoadType::Highway);
        assert_eq!(middle.road_type, RoadType::Arterial);
    }
}
