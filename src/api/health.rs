use axum::Json;
use serde_json::{Value, json};

/// Liveness endpoint for load balancers and deploy checks.
///
/// Reports the running crate version so a rollout can be verified from the
/// outside without shelling into the host.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
