use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use icyroute::models::{Coordinate, ObservationSource, RoutePoint, TemporalMode};
use icyroute::routing::Avoid;
use icyroute::weather::SimulatedWeather;
use icyroute::{
    AppState, IcyRouteConfig, RouteGeometry, RoutePlanner, RoutingProvider, WeatherAdapter,
    WeatherObservation, WeatherProvider, web,
};

/// One straight route, whatever is asked
struct StraightRoute;

#[async_trait]
impl RoutingProvider for StraightRoute {
    async fn routes(&self, _: &str, _: &str, _: Option<Avoid>) -> Vec<RouteGeometry> {
        // Minneapolis to Duluth, about 220 km
        let points = RoutePoint::sequence(
            (0..=40).map(|i| {
                let step = f64::from(i);
                Coordinate::new(44.98 + step * 0.045, -93.27 + step * 0.03)
            }),
        );
        vec![RouteGeometry {
            points,
            summary: "I-35 N".to_string(),
            distance_text: "156 mi".to_string(),
            duration_text: "2 hours 25 mins".to_string(),
            distance_meters: 251_000,
            duration_seconds: 8_700,
            bounds: None,
            polyline: "straight".to_string(),
        }]
    }
}

/// Routing backend that never finds anything
struct NoRoutes;

#[async_trait]
impl RoutingProvider for NoRoutes {
    async fn routes(&self, _: &str, _: &str, _: Option<Avoid>) -> Vec<RouteGeometry> {
        Vec::new()
    }
}

/// Routing backend that blows up mid-request
struct Exploding;

#[async_trait]
impl RoutingProvider for Exploding {
    async fn routes(&self, _: &str, _: &str, _: Option<Avoid>) -> Vec<RouteGeometry> {
        panic!("directions payload out of range");
    }
}

/// Straight route whose travel time text is absurdly large
struct EndlessRoute;

#[async_trait]
impl RoutingProvider for EndlessRoute {
    async fn routes(
        &self,
        origin: &str,
        destination: &str,
        avoid: Option<Avoid>,
    ) -> Vec<RouteGeometry> {
        let mut routes = StraightRoute.routes(origin, destination, avoid).await;
        for route in &mut routes {
            route.duration_text = "3000000 days".to_string();
        }
        routes
    }
}

struct FreezingRain;

#[async_trait]
impl WeatherProvider for FreezingRain {
    fn source(&self) -> ObservationSource {
        ObservationSource::Live
    }

    async fn observe(&self, _: &Coordinate, _: &TemporalMode) -> Result<WeatherObservation> {
        Ok(WeatherObservation {
            temperature: -1.0,
            humidity: 95.0,
            precipitation: 2.0,
            snowfall: None,
            wind_speed: 35.0,
            description: "freezing rain".to_string(),
            source: ObservationSource::Live,
        })
    }
}

fn app_with(routing: Arc<dyn RoutingProvider>, weather: WeatherAdapter) -> Router {
    let planner = RoutePlanner::new(routing, Arc::new(weather), &IcyRouteConfig::default());
    web::app(AppState {
        planner: Arc::new(planner),
    })
}

fn simulated_app() -> Router {
    app_with(
        Arc::new(StraightRoute),
        WeatherAdapter::simulated(Arc::new(SimulatedWeather::new(Some(42)).with_month(1))),
    )
}

fn freezing_app() -> Router {
    let provider: Arc<dyn WeatherProvider> = Arc::new(FreezingRain);
    app_with(
        Arc::new(StraightRoute),
        WeatherAdapter::new(
            provider.clone(),
            provider,
            Arc::new(SimulatedWeather::new(Some(1))),
            Duration::from_secs(1),
        ),
    )
}

async fn post_routes(app: Router, payload: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/routes")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_plan_routes_for_winter_event() {
    let (status, body) = post_routes(
        simulated_app(),
        json!({
            "origin": "Minneapolis, MN",
            "destination": "Duluth, MN",
            "driver_experience": "expert"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["driver_experience"], "expert");
    assert_eq!(body["weather_source"], "simulated");
    assert_eq!(body["winter_event"]["date"], "January 15, 2024");
    assert_eq!(body["policy_version"], "2024.1");

    let routes = body["routes"].as_array().unwrap();
    // highway, arterial and local variants of the single base route
    assert_eq!(routes.len(), 3);
    for route in routes {
        let risk = route["avg_ice_risk"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&risk));
        assert!(route["safety_score"].as_u64().unwrap() <= 100);
        assert!(!route["weather_points"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_plan_routes_is_reproducible_with_seed() {
    let payload = json!({
        "origin": "Chicago, IL",
        "destination": "Madison, WI",
        "driver_experience": "expert"
    });
    let (_, first) = post_routes(simulated_app(), payload.clone()).await;
    let (_, second) = post_routes(simulated_app(), payload).await;

    assert_eq!(first["routes"], second["routes"]);
    assert!(first.get("winter_event").is_none());
}

#[tokio::test]
async fn test_beginner_always_gets_a_route() {
    let (status, body) = post_routes(
        freezing_app(),
        json!({
            "origin": "Chicago, IL",
            "destination": "Madison, WI",
            "driver_experience": "beginner"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["weather_source"], "current");
    let routes = body["routes"].as_array().unwrap();
    assert_eq!(routes.len(), 1);
    assert!(routes[0]["avg_ice_risk"].as_f64().unwrap() >= 0.5);
    assert!(
        routes[0]["experience_note"]
            .as_str()
            .unwrap()
            .starts_with("Above beginner risk level")
    );
}

#[tokio::test]
async fn test_avoid_icy_orders_by_risk() {
    let (_, body) = post_routes(
        freezing_app(),
        json!({
            "origin": "Chicago, IL",
            "destination": "Madison, WI",
            "driver_experience": "expert",
            "avoid_icy": true
        }),
    )
    .await;

    let risks: Vec<f64> = body["routes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|route| route["avg_ice_risk"].as_f64().unwrap())
        .collect();
    assert!(risks.len() > 1);
    assert!(risks.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn test_missing_origin_is_rejected() {
    let (status, body) = post_routes(simulated_app(), json!({"destination": "Duluth, MN"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
    assert!(body["error"].as_str().unwrap().contains("Origin and destination"));
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/routes")
        .header("content-type", "application/json")
        .body(Body::from("{\"origin\": "))
        .unwrap();

    let response = simulated_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_no_routes_reports_status() {
    let app = app_with(
        Arc::new(NoRoutes),
        WeatherAdapter::simulated(Arc::new(SimulatedWeather::new(Some(3)))),
    );
    let payload = json!({"origin": "Nowhere", "destination": "Elsewhere"});
    let (status, body) = post_routes(app, payload).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["routes"].as_array().unwrap().is_empty());
    assert_eq!(body["status"], "No routes found between Nowhere and Elsewhere");
}

#[tokio::test]
async fn test_panicking_provider_yields_internal_error() {
    let app = app_with(
        Arc::new(Exploding),
        WeatherAdapter::simulated(Arc::new(SimulatedWeather::new(Some(5)))),
    );
    let payload = json!({"origin": "Chicago, IL", "destination": "Madison, WI"});
    let (status, body) = post_routes(app, payload).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "internal");
    let message = body["error"].as_str().unwrap();
    assert!(!message.contains("directions payload"));
}

#[tokio::test]
async fn test_oversized_duration_is_planned() {
    let app = app_with(
        Arc::new(EndlessRoute),
        WeatherAdapter::simulated(Arc::new(SimulatedWeather::new(Some(6)).with_month(1))),
    );
    let (status, body) = post_routes(
        app,
        json!({
            "origin": "Chicago, IL",
            "destination": "Madison, WI",
            "driver_experience": "expert"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let routes = body["routes"].as_array().unwrap();
    assert_eq!(routes.len(), 3);
    assert!(routes.iter().all(|route| route["duration"] == "3000000 days"));
}

#[tokio::test]
async fn test_demo_routes_lists_winter_events() {
    let (status, body) = get_json(simulated_app(), "/api/demo-routes").await;

    assert_eq!(status, StatusCode::OK);
    let listings = body["demo_routes"].as_array().unwrap();
    assert_eq!(listings.len(), 3);
    assert!(listings.iter().all(|listing| {
        listing["description"]
            .as_str()
            .is_some_and(|d| d.starts_with("Experience "))
    }));
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get_json(simulated_app(), "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], icyroute::VERSION);
}
