//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::warn;

use crate::hub::PollHandle;
use crate::poller::{OPTION_SLOTS, OptionView};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/instances", get(list_instances))
        .route("/api/instances/:id/routes", get(list_routes))
        .route("/api/instances/:id/routes/:route", get(get_route))
        .route(
            "/api/instances/:id/routes/:route/options/:slot",
            get(get_option),
        )
        .route("/api/refresh", post(refresh))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// List registered instances.
async fn list_instances(State(state): State<AppState>) -> Json<InstancesResponse> {
    let mut instances = Vec::new();

    for id in state.hub.entry_ids().await {
        let Some(poller) = state.hub.get(&id).await else {
            continue;
        };
        let snapshot = poller.snapshot().await;
        instances.push(InstanceSummary {
            id,
            routes: poller.route_names(),
            updated_at: snapshot.updated_at().map(format_timestamp),
        });
    }

    Json(InstancesResponse { instances })
}

/// Summaries of every route in an instance.
async fn list_routes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RoutesResponse>, AppError> {
    let poller = instance(&state, &id).await?;
    let snapshot = poller.snapshot().await;

    let routes = poller
        .route_names()
        .iter()
        .map(|name| RouteSummary::from_snapshot(name, &snapshot))
        .collect();

    Ok(Json(RoutesResponse {
        instance: id,
        routes,
    }))
}

/// Latest data for one route.
async fn get_route(
    State(state): State<AppState>,
    Path((id, route)): Path<(String, String)>,
) -> Result<Json<RouteResponse>, AppError> {
    let poller = instance(&state, &id).await?;
    if !poller.has_route(&route) {
        return Err(AppError::NotFound {
            message: format!("Unknown route: {route}"),
        });
    }

    let snapshot = poller.snapshot().await;
    Ok(Json(RouteResponse::from_snapshot(&route, &snapshot)))
}

/// One option slot of a route.
///
/// A route or option with no data yields an empty view, not an error.
async fn get_option(
    State(state): State<AppState>,
    Path((id, route, slot)): Path<(String, String, usize)>,
) -> Result<Json<OptionView>, AppError> {
    if !(1..=OPTION_SLOTS).contains(&slot) {
        return Err(AppError::BadRequest {
            message: format!("Option must be between 1 and {OPTION_SLOTS}, got {slot}"),
        });
    }

    let poller = instance(&state, &id).await?;
    let snapshot = poller.snapshot().await;
    Ok(Json(snapshot.option_view(&route, slot)))
}

/// Manual refresh. An empty body refreshes everything; a body that is not
/// a valid filter is rejected.
async fn refresh(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RefreshResponse>, AppError> {
    let req = parse_refresh(&body)?;
    let refreshed = state
        .hub
        .refresh(req.entry_id.as_deref(), req.route.as_deref())
        .await;
    Ok(Json(RefreshResponse { refreshed }))
}

fn parse_refresh(body: &[u8]) -> Result<RefreshRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RefreshRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest {
        message: format!("Invalid refresh request: {e}"),
    })
}

async fn instance(state: &AppState, id: &str) -> Result<Arc<dyn PollHandle>, AppError> {
    state.hub.get(id).await.ok_or_else(|| AppError::NotFound {
        message: format!("Unknown instance: {id}"),
    })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
        };

        warn!(%status, %message, "Request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
