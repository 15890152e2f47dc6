//! HTTP surface — Axum JSON API over the scan orchestrator.
//!
//! Serves the scan start/status/results endpoints and the strategy
//! listing. CORS enabled for local development; rendering is left to
//! whatever front end polls this API.

pub mod routes;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use routes::AppState;

/// Start the API server on a background task — does not block.
pub fn spawn_server(state: AppState, port: u16) {
    let app = build_router(state);

    tokio::spawn(async move {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        info!(port, "API server starting on http://localhost:{port}");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind API port");

        axum::serve(listener, app).await.expect("API server error");
    });
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/strategies", get(routes::list_strategies))
        .route("/api/scan/start", post(routes::start_scan))
        .route("/api/scan/status", get(routes::scan_status))
        .route("/api/scan/results", get(routes::scan_results))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
