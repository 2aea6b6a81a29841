use actix_web::{
    http::{header, StatusCode},
    test, web, App,
};
use seedream_gateway::{
    server::{configure, AppState},
    Config, FalConfig,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_string, header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn state() -> AppState {
    let fal = FalConfig::new()
        .with_api_key("secret-key")
        .with_proxy_hosts(["127.0.0.1"]);
    AppState::from_config(Config::new().with_fal(fal)).unwrap()
}

#[actix_web::test]
async fn test_proxy_forwards_with_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fal-ai/flux/dev"))
        .and(header_eq("authorization", "Key secret-key"))
        .and(header_eq("content-type", "application/json"))
        .and(body_string(r#"{"prompt":"a fox"}"#))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("x-fal-request-id", "abc")
                .set_body_json(json!({"request_id": "abc"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = test::init_service(App::new().configure(configure(state()))).await;
    let req = test::TestRequest::post()
        .uri("/api/fal-proxy")
        .insert_header(("X-Fal-Target-Url", format!("{}/fal-ai/flux/dev", server.uri())))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload(r#"{"prompt":"a fox"}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert_eq!(resp.headers().get("x-fal-request-id").unwrap(), "abc");
    assert!(resp.headers().get(header::TRANSFER_ENCODING).is_none());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["request_id"], "abc");
}

#[actix_web::test]
async fn test_proxy_get_and_put() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/requests/abc/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "IN_QUEUE"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/requests/abc/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let app = test::init_service(App::new().configure(configure(state()))).await;

    let req = test::TestRequest::get()
        .uri("/api/fal-proxy")
        .insert_header((
            "X-Fal-Target-Url",
            format!("{}/requests/abc/status", server.uri()),
        ))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "IN_QUEUE");

    let req = test::TestRequest::put()
        .uri("/api/fal-proxy")
        .insert_header((
            "X-Fal-Target-Url",
            format!("{}/requests/abc/cancel", server.uri()),
        ))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, web::Bytes::from_static(b"ok"));
}

#[actix_web::test]
async fn test_proxy_wraps_upstream_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fal-ai/flux/dev"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let app = test::init_service(App::new().configure(configure(state()))).await;
    let req = test::TestRequest::post()
        .uri("/api/fal-proxy")
        .insert_header(("X-Fal-Target-Url", format!("{}/fal-ai/flux/dev", server.uri())))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "forbidden"}));
}

#[actix_web::test]
async fn test_proxy_transport_failure_is_500() {
    let app = test::init_service(App::new().configure(configure(state()))).await;
    let req = test::TestRequest::get()
        .uri("/api/fal-proxy")
        .insert_header(("X-Fal-Target-Url", "http://127.0.0.1:1/unreachable"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn test_default_allowlist_keeps_credential_home() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let fal = FalConfig::new().with_api_key("secret-key");
    let state = AppState::from_config(Config::new().with_fal(fal)).unwrap();
    let app = test::init_service(App::new().configure(configure(state))).await;
    let req = test::TestRequest::post()
        .uri("/api/fal-proxy")
        .insert_header(("X-Fal-Target-Url", format!("{}/collect", server.uri())))
        .set_payload("{}")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "X-Fal-Target-Url host is not allowed");
}
