use axum::response::Json;
use serde_json::json;

/// Health check endpoint handler.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/ping`
/// - **Response**: `{"status":"pong"}`
///
/// Lightweight probe for load balancers, container orchestrators, and
/// uptime monitors.
pub async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "status": "pong" }))
}

/// Service health endpoint.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/api/health`
///
/// Reports the service name and version alongside the status, for
/// dashboards that want more than a bare pong.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "Market Intelligence Server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
