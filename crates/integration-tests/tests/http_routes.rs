//! Router-level tests over an in-memory session store.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
    routing::post,
};
use tower::ServiceExt;
use tower_sessions::{MemoryStore as SessionStore, Session, SessionManagerLayer};

use boutique_core::UserId;
use boutique_integration_tests::{ScriptedGateway, config, shop};
use boutique_storefront::app;
use boutique_storefront::middleware::{LOGIN_PATH, set_current_user};
use boutique_storefront::models::CurrentUser;
use boutique_storefront::state::AppState;

const TEST_LOGIN: &str = "/test/login";

async fn login(session: Session) -> StatusCode {
    set_current_user(&session, &CurrentUser { id: UserId::new(1) })
        .await
        .unwrap();
    StatusCode::NO_CONTENT
}

async fn router() -> Router {
    let state = AppState::new(
        config(),
        Arc::new(shop().await),
        Arc::new(ScriptedGateway::new()),
    );
    Router::new()
        .route(TEST_LOGIN, post(login))
        .merge(app(state))
        .layer(SessionManagerLayer::new(SessionStore::default()))
}

async fn send(router: &Router, method: &str, uri: &str, cookie: Option<&str>) -> Response {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    router
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

/// Sign in and return the session cookie pair.
async fn signed_in(router: &Router) -> String {
    let response = send(router, "POST", TEST_LOGIN, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_owned()
}

#[tokio::test]
async fn test_catalog_lists_items() {
    let router = router().await;
    let response = send(&router, "GET", "/", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("WIDGET"));
    assert!(body.contains("SCARF"));
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let router = router().await;
    let response = send(&router, "GET", "/product/missing", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_probes() {
    let router = router().await;
    for uri in ["/health", "/health/ready"] {
        let response = send(&router, "GET", uri, None).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn test_anonymous_cart_redirects_to_login() {
    let router = router().await;

    let response = send(&router, "GET", "/order-summary", None).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), LOGIN_PATH);

    let response = send(&router, "POST", "/add-to-cart/widget", None).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), LOGIN_PATH);
}

#[tokio::test]
async fn test_add_to_cart_then_view_summary() {
    let router = router().await;
    let cookie = signed_in(&router).await;

    let response = send(&router, "POST", "/add-to-cart/widget", Some(&cookie)).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/order-summary");

    let response = send(&router, "GET", "/order-summary", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("WIDGET"));
    assert!(body.contains("€10.00"));
    assert!(body.contains("This item was added to your cart"));
}

#[tokio::test]
async fn test_empty_cart_summary_redirects_home() {
    let router = router().await;
    let cookie = signed_in(&router).await;

    let response = send(&router, "GET", "/order-summary", Some(&cookie)).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/");
}
