//! A liveness endpoint for load balancers and the frontend.

use serde_json::{Value, json};

use crate::json::Json;

/// Report that the server is running.
pub async fn get_health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Backend is running",
    }))
}
