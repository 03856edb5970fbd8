//! Landing and health check endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use super::ROUTES;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RouteInfo {
    pub method: &'static str,
    pub path: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LandingResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub routes: Vec<RouteInfo>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub categorizer: Option<&'static str>,
    pub storage: String,
}

/// Service landing info.
/// GET /
pub async fn landing() -> Json<LandingResponse> {
    Json(LandingResponse {
        name: "cardfold",
        version: env!("CARGO_PKG_VERSION"),
        routes: ROUTES
            .iter()
            .map(|&(method, path)| RouteInfo { method, path })
            .collect(),
    })
}

/// Health check endpoint.
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        categorizer: state.library.categorizer_name(),
        storage: state.config.storage.backend.to_string(),
    }))
}
