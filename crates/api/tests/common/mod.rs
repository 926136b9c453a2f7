#![allow(dead_code)]

use std::collections::HashMap;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use tower::ServiceExt;

use shortlink_api::config::ServerConfig;
use shortlink_api::router::build_app_router;
use shortlink_api::state::AppState;

pub const TEST_SECRET: &str = "integration-test-cookie-secret-0123456789";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    test_config_with(&[])
}

/// Test configuration with extra variables layered over the defaults.
pub fn test_config_with(extra: &[(&'static str, &'static str)]) -> ServerConfig {
    let mut vars: HashMap<&str, &str> = HashMap::from([
        ("HOST", "127.0.0.1"),
        ("PORT", "0"),
        ("COOKIE_SECRET", TEST_SECRET),
    ]);
    vars.extend(extra.iter().copied());
    ServerConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
        .expect("test config is valid")
}

/// State over `pool` with the test configuration.
pub fn test_state(pool: SqlitePool) -> AppState {
    AppState::new(pool, test_config())
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(pool: SqlitePool) -> Router {
    build_app_router(test_state(pool))
}

fn request(method: Method, uri: &str, cookie: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(request(Method::GET, uri, None, None)).await.unwrap()
}

pub async fn get_with_cookie(app: Router, uri: &str, cookie: &str) -> Response<Body> {
    app.oneshot(request(Method::GET, uri, Some(cookie), None))
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(request(Method::POST, uri, None, Some(body)))
        .await
        .unwrap()
}

pub async fn post_json_with_cookie(
    app: Router,
    uri: &str,
    cookie: &str,
    body: serde_json::Value,
) -> Response<Body> {
    app.oneshot(request(Method::POST, uri, Some(cookie), Some(body)))
        .await
        .unwrap()
}

pub async fn post_with_cookie(app: Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    app.oneshot(request(Method::POST, uri, cookie, None))
        .await
        .unwrap()
}

pub async fn delete_with_cookie(app: Router, uri: &str, cookie: &str) -> Response<Body> {
    app.oneshot(request(Method::DELETE, uri, Some(cookie), None))
        .await
        .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// The `Set-Cookie` header value, if any.
pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Turn a `Set-Cookie` value into the `name=value` pair a browser would send.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Register an account through the API.
pub async fn register(app: Router, email: &str, password: &str) -> Response<Body> {
    post_json(
        app,
        "/api/v1/auth/register",
        serde_json::json!({ "email": email, "password": password }),
    )
    .await
}

/// Register and log in, returning the cookie pair to send on later requests.
pub async fn register_and_login(app: Router, email: &str) -> String {
    let password = "test_password_123!";
    let response = register(app.clone(), email, password).await;
    assert_eq!(response.status(), StatusCode::CREATED, "registration should succeed");

    let response = post_json(
        app,
        "/api/v1/auth/login",
        serde_json::json!({ "email": email, "password": password }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login should succeed");
    cookie_pair(&set_cookie(&response).expect("login sets a cookie"))
}
