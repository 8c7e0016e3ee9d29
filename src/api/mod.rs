use std::sync::Arc;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;

use crate::{
    IcyRouteError, VERSION,
    events::EventListing,
    planner::{RoutePlanner, RouteRequest, RouteResponse},
};

#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<RoutePlanner>,
}

#[derive(Serialize)]
pub struct DemoRoutes {
    pub demo_routes: Vec<EventListing>,
}

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

/// Error surfaced to HTTP clients as `{"error": ..., "code": ...}`
pub struct ApiError(IcyRouteError);

impl From<IcyRouteError> for ApiError {
    fn from(error: IcyRouteError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!("Request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = json!({
            "error": self.0.user_message(),
            "code": self.0.code(),
        });
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/routes", post(plan_routes))
        .route("/demo-routes", get(demo_routes))
        .route("/health", get(health))
        .with_state(state)
}

async fn plan_routes(
    State(state): State<AppState>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> Result<Json<RouteResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| IcyRouteError::validation(rejection.body_text()))?;
    let response = state.planner.plan(&request).await?;
    Ok(Json(response))
}

async fn demo_routes(State(state): State<AppState>) -> Json<DemoRoutes> {
    let demo_routes = state
        .planner
        .events()
        .events()
        .iter()
        .map(|event| event.listing())
        .collect();
    Json(DemoRoutes { demo_routes })
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: VERSION,
    })
}
