use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::sources::Source;

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let sources: Vec<&str> = Source::ALL.iter().map(Source::name).collect();

    Json(json!({
        "name": "Epidata API (Rust)",
        "version": version,
        "description": "Epidemiological time-series queries with issue versioning and regional rollup",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "epidata": "/api/epidata?source=...",
        },
        "sources": sources,
        "max_results": state.service.max_results(),
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.service.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database": e.message()
            })),
        ),
    }
}
