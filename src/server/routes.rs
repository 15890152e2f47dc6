//! API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<ApiContext>`;
//! scan errors map onto the HTTP codes the front end keys off
//! (409 for a busy scanner, 404 for unknown strategy / no results).

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::engine::job::{JobManager, StatusSnapshot};
use crate::strategies::StrategyRegistry;
use crate::types::{ScanError, ScanResult, ScanType, StrategyDescriptor};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ApiContext {
    pub jobs: Arc<JobManager>,
    pub registry: Arc<StrategyRegistry>,
}

pub type AppState = Arc<ApiContext>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StartScanRequest {
    pub strategy: String,
    #[serde(rename = "type", default = "default_scan_type")]
    pub scan_type: ScanType,
}

fn default_scan_type() -> ScanType {
    ScanType::Quick
}

#[derive(Debug, Serialize)]
pub struct StartScanResponse {
    pub status: &'static str,
    pub job_id: Uuid,
    pub total: usize,
}

/// Error envelope with the status code the taxonomy prescribes.
pub struct ApiError(ScanError);

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ScanError::AlreadyRunning => StatusCode::CONFLICT,
            ScanError::UnknownStrategy(_) | ScanError::NoResults => StatusCode::NOT_FOUND,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/strategies
pub async fn list_strategies(
    State(state): State<AppState>,
) -> Json<Vec<StrategyDescriptor>> {
    Json(state.registry.descriptors())
}

/// POST /api/scan/start
pub async fn start_scan(
    State(state): State<AppState>,
    Json(req): Json<StartScanRequest>,
) -> Result<Json<StartScanResponse>, ApiError> {
    let job_id = state.jobs.start_scan(&req.strategy, req.scan_type).await?;
    let status = state.jobs.status().await;
    Ok(Json(StartScanResponse {
        status: "started",
        job_id,
        total: status.total,
    }))
}

/// GET /api/scan/status
pub async fn scan_status(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.jobs.status().await)
}

/// GET /api/scan/results
pub async fn scan_results(
    State(state): State<AppState>,
) -> Result<Json<ScanResult>, ApiError> {
    let result = state.jobs.results().await?;
    Ok(Json(result))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_request_parses_type_field() {
        let req: StartScanRequest =
            serde_json::from_str(r#"{"strategy": "iv_crush", "type": "full"}"#).unwrap();
        assert_eq!(req.strategy, "iv_crush");
        assert_eq!(req.scan_type, ScanType::Full);
    }

    #[test]
    fn test_start_request_defaults_to_quick() {
        let req: StartScanRequest =
            serde_json::from_str(r#"{"strategy": "iv_crush"}"#).unwrap();
        assert_eq!(req.scan_type, ScanType::Quick);
    }

    #[test]
    fn test_api_error_status_codes() {
        let resp = ApiError(ScanError::AlreadyRunning).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = ApiError(ScanError::UnknownStrategy("x".into())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = ApiError(ScanError::NoResults).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_start_response_serializes() {
        let resp = StartScanResponse {
            status: "started",
            job_id: Uuid::nil(),
            total: 30,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "started");
        assert_eq!(json["total"], 30);
    }
}
