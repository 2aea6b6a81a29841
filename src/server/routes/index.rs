use crate::server::{cors, state::AppState};
use actix_web::{http::Method, web, HttpResponse};
use serde_json::json;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    for path in ["/", "/api"] {
        cfg.service(
            web::resource(path)
                .route(web::get().to(index))
                .route(web::method(Method::OPTIONS).to(cors::index_preflight)),
        );
    }

    cfg.service(
        web::resource("/api/health")
            .route(web::get().to(health))
            .route(web::method(Method::OPTIONS).to(cors::index_preflight)),
    );
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Seedream gateway is running",
        "endpoints": {
            "health": "/api/health",
            "edit": "/api/edit (POST)",
            "generate": "/api/generate (POST)",
            "batch": "/api/batch (POST)",
            "upload": "/api/upload (POST)",
            "video": "/api/video (POST)",
            "proxy": "/api/fal-proxy (GET, POST, PUT)",
        }
    }))
}

/// Liveness plus whether a provider credential is present.
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    log::debug!("Health check requested");
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "configured": state.is_configured(),
    }))
}
