//! HTTP surface: actix-web app, routes and shared state.

pub mod cors;
pub mod routes;
pub mod state;


use crate::{
    config::Config,
    error::{GatewayError, Result},
};
use actix_web::{
    middleware::{DefaultHeaders, Logger},
    web, App, HttpServer,
};

pub use state::AppState;

/// Registers shared state and every route. Shared by `run` and tests.
///
/// Bodies are read as raw payloads inside the handlers, so the
/// `max_body_bytes` limit is enforced after the credential check and
/// reported as a JSON error.
pub fn configure(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(state));
        routes::configure_routes(cfg);
    }
}

pub async fn run(config: Config) -> Result<()> {
    let bind_address = config.bind_address();
    let state = AppState::from_config(config)?;

    log::info!("Setting up routes and middleware");
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(DefaultHeaders::new().add(("Access-Control-Allow-Origin", cors::ALLOW_ORIGIN)))
            .configure(configure(state.clone()))
    })
    .bind(&bind_address)
    .map_err(|e| {
        GatewayError::ConfigError(format!("Failed to bind {}: {}", bind_address, e))
    })?;

    log::info!("✅ Server listening on http://{}", bind_address);
    server
        .run()
        .await
        .map_err(|e| GatewayError::InternalError(format!("Server error: {}", e)))
}
