//! CORS preflight responses.
//!
//! `Access-Control-Allow-Origin: *` is added to every response by the
//! `DefaultHeaders` middleware; these handlers only answer `OPTIONS`.

use actix_web::{http::header, HttpResponse};

pub const ALLOW_ORIGIN: &str = "*";

const CAPABILITY_METHODS: &str = "POST, OPTIONS";
const INDEX_METHODS: &str = "GET, POST, OPTIONS";
const PROXY_METHODS: &str = "GET, POST, PUT, OPTIONS";
const DEFAULT_HEADERS: &str = "Content-Type";
const PROXY_HEADERS: &str = "Content-Type, Authorization, X-Fal-Target-Url";
const PROXY_MAX_AGE: &str = "86400";

/// Preflight for the POST-only capability endpoints.
pub async fn preflight() -> HttpResponse {
    build(CAPABILITY_METHODS, DEFAULT_HEADERS, None)
}

pub async fn index_preflight() -> HttpResponse {
    build(INDEX_METHODS, DEFAULT_HEADERS, None)
}

pub async fn proxy_preflight() -> HttpResponse {
    build(PROXY_METHODS, PROXY_HEADERS, Some(PROXY_MAX_AGE))
}

fn build(methods: &str, headers: &str, max_age: Option<&str>) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    response
        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, methods))
        .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, headers));
    if let Some(max_age) = max_age {
        response.insert_header((header::ACCESS_CONTROL_MAX_AGE, max_age));
    }
    response.finish()
}
