use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

pub const SERVICE_NAME: &str = "storefront-api";

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

pub fn health_routes() -> Router {
    Router::new().route("/health", get(health))
}
