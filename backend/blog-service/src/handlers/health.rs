use actix_web::{web, HttpResponse};

use crate::AppState;

/// Liveness plus a store round-trip
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.store.health_check().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "blog-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("content store check failed: {}", e),
            "service": "blog-service"
        })),
    }
}
