use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - service banner and endpoint index
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Hyfen API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Multi-tenant property and booking management for pousadas",
            "endpoints": {
                "public": "/api/v1/pousada, /api/v1/public/properties[/:slug], /api/v1/plans",
                "properties": "/api/v1/properties[/:id[/access|/subscription|/guests|/reservations|/invoices]] (protected)",
                "accommodations": "/api/v1/accommodations[/:id] (protected)",
                "images": "/api/v1/images[/:id] (protected)",
                "tenants": "/api/v1/tenants (protected)",
                "dashboard": "/api/v1/dashboard/stats (protected)",
                "saas": "/api/v1/saas/stats, /api/v1/saas/clients (staff only)",
            }
        }
    }))
}

/// GET /health - liveness plus store connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
