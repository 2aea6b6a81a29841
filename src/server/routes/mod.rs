//! HTTP route modules

pub mod batch;
pub mod generation;
pub mod index;
pub mod proxy;

use crate::error::{GatewayError, Result};
use actix_web::{http::header, web, HttpRequest};
use futures::StreamExt;
use serde::de::DeserializeOwned;

pub const INVALID_JSON: &str = "Invalid JSON";
pub const JSON_REQUIRED: &str = "Content-Type must be application/json";
pub const BODY_TOO_LARGE: &str = "Request body too large";

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    index::configure_routes(cfg);
    generation::configure_routes(cfg);
    batch::configure_routes(cfg);
    proxy::configure_routes(cfg);
}

pub(crate) fn content_type(req: &HttpRequest) -> &str {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Decodes a JSON body after checking the declared content type.
pub(crate) fn parse_json<T: DeserializeOwned>(req: &HttpRequest, body: &[u8]) -> Result<T> {
    if !content_type(req).contains("application/json") {
        return Err(GatewayError::ClientError(JSON_REQUIRED.into()));
    }
    decode_json(body)
}

/// Decodes a JSON body whatever content type was declared. Browser `fetch`
/// calls with a string body arrive as `text/plain`.
pub(crate) fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        log::debug!("Rejected request body: {}", e);
        GatewayError::ClientError(INVALID_JSON.into())
    })
}

/// Buffers a raw payload stream, refusing anything over `limit` bytes.
/// Handlers call this only after the credential check.
pub(crate) async fn read_body(mut payload: web::Payload, limit: usize) -> Result<web::Bytes> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk
            .map_err(|e| GatewayError::ClientError(format!("Failed to read request body: {}", e)))?;
        if body.len() + chunk.len() > limit {
            return Err(GatewayError::ClientError(BODY_TOO_LARGE.into()));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}
