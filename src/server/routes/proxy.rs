//! Credential-holding pass-through to the provider API, so browser clients
//! never see the key.

use super::read_body;
use crate::{
    error::{GatewayError, Result},
    server::{cors, state::AppState},
};
use actix_web::{
    http::{
        header::{self, HeaderName, HeaderValue},
        Method, StatusCode,
    },
    web, HttpRequest, HttpResponse,
};
use serde_json::json;

pub const TARGET_HEADER: &str = "x-fal-target-url";
pub const MISSING_TARGET: &str = "Missing X-Fal-Target-Url header";
pub const INVALID_TARGET: &str = "Invalid X-Fal-Target-Url header";
pub const TARGET_NOT_ALLOWED: &str = "X-Fal-Target-Url host is not allowed";

/// Upstream response headers that are not relayed. The body is re-emitted
/// fully read, so framing and encoding headers no longer apply.
const STRIPPED_HEADERS: [&str; 5] = [
    "transfer-encoding",
    "content-encoding",
    "connection",
    "content-length",
    "access-control-allow-origin",
];

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/fal-proxy")
            .route(web::get().to(proxy))
            .route(web::post().to(proxy))
            .route(web::put().to(proxy))
            .route(web::method(Method::OPTIONS).to(cors::proxy_preflight)),
    );
}

pub async fn proxy(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse> {
    let api_key = state.api_key()?;
    let target = req
        .headers()
        .get(TARGET_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| GatewayError::ClientError(MISSING_TARGET.into()))?;
    let target = checked_target(&state, target)?;
    let body = read_body(payload, state.config.max_body_bytes).await?;

    let method = reqwest::Method::from_bytes(req.method().as_str().as_bytes())
        .map_err(|e| GatewayError::ClientError(format!("Unsupported method: {}", e)))?;
    log::debug!("Proxying {} {}", method, target);

    let mut upstream = state
        .http()
        .request(method, target)
        .header(reqwest::header::AUTHORIZATION, format!("Key {}", api_key));
    if let Some(content_type) = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    {
        upstream = upstream.header(reqwest::header::CONTENT_TYPE, content_type);
    }
    if !body.is_empty() {
        upstream = upstream.body(body.to_vec());
    }

    let response = upstream.send().await?;
    let status = StatusCode::from_u16(response.status().as_u16())
        .map_err(|e| GatewayError::InternalError(e.to_string()))?;

    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        log::warn!("Proxy target answered {}", status);
        return Ok(HttpResponse::build(status).json(json!({ "error": error_body })));
    }

    let mut builder = HttpResponse::build(status);
    for (name, value) in response.headers() {
        if STRIPPED_HEADERS.contains(&name.as_str()) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_str().as_bytes()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) {
            builder.append_header((name, value));
        }
    }

    let bytes = response.bytes().await?;
    Ok(builder.body(bytes))
}

/// The credential is attached to every forwarded request, so only http(s)
/// targets on the configured provider hosts are accepted.
fn checked_target(state: &AppState, target: &str) -> Result<reqwest::Url> {
    let url = reqwest::Url::parse(target)
        .map_err(|_| GatewayError::ClientError(INVALID_TARGET.into()))?;
    let host = match url.scheme() {
        "http" | "https" => url.host_str(),
        _ => None,
    }
    .ok_or_else(|| GatewayError::ClientError(INVALID_TARGET.into()))?;

    if !state.config.fal.allows_proxy_host(host) {
        log::warn!("Refused proxy target host {}", host);
        return Err(GatewayError::ClientError(TARGET_NOT_ALLOWED.into()));
    }
    Ok(url)
}
