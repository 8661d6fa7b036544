//! REST API routes.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::loops::session_loop::SessionCommand;
use crate::state::AppState;
use geonav_core::{NavError, Place, RouteMarker, SessionSnapshot};

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/v1/session", get(get_session))
        .route("/v1/session/enter", post(enter_session))
        .route("/v1/session/exit", post(exit_session))
        .route("/v1/anchors", get(list_anchors))
        .route("/v1/places", get(list_places))
        .route("/v1/navigate", post(navigate))
}

#[derive(Debug, Deserialize, Serialize)]
pub struct NavigateRequest {
    pub destination_id: i64,
}

async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.snapshot())
}

async fn list_anchors(State(state): State<Arc<AppState>>) -> Json<Vec<RouteMarker>> {
    Json(state.snapshot().anchors)
}

async fn list_places(State(state): State<Arc<AppState>>) -> Json<Vec<Place>> {
    Json(state.places())
}

async fn enter_session(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    command_response(state.send_command(SessionCommand::EnterArView).await, json!({}))
}

async fn exit_session(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    command_response(state.send_command(SessionCommand::ExitArView).await, json!({}))
}

async fn navigate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NavigateRequest>,
) -> (StatusCode, Json<Value>) {
    if !state.is_known_destination(req.destination_id) {
        return command_response(
            Err(NavError::InvalidDestination(req.destination_id)),
            Value::Null,
        );
    }

    let result = state
        .send_command(SessionCommand::SelectDestination {
            destination_id: req.destination_id,
        })
        .await;
    command_response(result, json!({ "destination_id": req.destination_id }))
}

fn command_response(result: Result<(), NavError>, accepted: Value) -> (StatusCode, Json<Value>) {
    match result {
        Ok(()) => (StatusCode::ACCEPTED, Json(accepted)),
        Err(err) => {
            let status = match err {
                NavError::InvalidDestination(_) => StatusCode::BAD_REQUEST,
                NavError::LocationUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                NavError::SessionTerminating(_) => StatusCode::CONFLICT,
            };
            tracing::warn!("Rejected session command: {}", err);
            (status, Json(json!({ "error": err.to_string() })))
        }
    }
}
