//! Forwarding behaviour of the same-host HTTP proxy.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use membrane::config::ProxyConfig;
use membrane::proxy::{ForwardContext, HttpServerProxy, Proxy, ProxyError};

mod common;

use common::MockResponse;

#[tokio::test]
async fn test_forward_rewrites_only_scheme_and_authority() {
    let (addr, mut requests) = common::start_recording_backend().await;
    let proxy = HttpServerProxy::new(addr.to_string(), &ProxyConfig::default()).unwrap();

    let request = Request::builder()
        .method("PUT")
        .uri("https://original-host/foo?x=1")
        .header("x-custom", "kept")
        .header("x-forwarded-for", "original-host")
        .body(Body::from("hello"))
        .unwrap();

    let response = proxy
        .forward(&ForwardContext::background(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let seen = requests.recv().await.unwrap();
    assert_eq!(seen.request_line, "PUT /foo?x=1 HTTP/1.1");
    assert_eq!(seen.header("x-custom"), Some("kept"));
    assert_eq!(seen.header("x-forwarded-for"), Some("original-host"));
    assert_eq!(seen.header("host"), Some(addr.to_string().as_str()));
    assert_eq!(seen.body, b"hello");
}

#[tokio::test]
async fn test_redirect_is_surfaced_not_followed() {
    let addr = common::start_programmable_backend(|request| async move {
        if request.request_line.starts_with("GET /start ") {
            MockResponse::new(302, "").header("Location", "/elsewhere")
        } else {
            MockResponse::new(200, "followed")
        }
    })
    .await;
    let proxy = HttpServerProxy::new(addr.to_string(), &ProxyConfig::default()).unwrap();

    let request = Request::get("/start").body(Body::empty()).unwrap();
    let response = proxy
        .forward(&ForwardContext::background(), request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()["location"], "/elsewhere");
}

#[tokio::test]
async fn test_cancel_returns_promptly() {
    let addr = common::start_silent_backend().await;
    let proxy = HttpServerProxy::new(addr.to_string(), &ProxyConfig::default()).unwrap();
    let (ctx, cancel) = ForwardContext::cancellable();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let request = Request::get("/hang").body(Body::empty()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(2), proxy.forward(&ctx, request))
        .await
        .expect("forward must not hang after cancellation");

    assert!(matches!(result, Err(ProxyError::Canceled)));
}

#[tokio::test]
async fn test_deadline_returns_promptly() {
    let addr = common::start_silent_backend().await;
    let proxy = HttpServerProxy::new(addr.to_string(), &ProxyConfig::default()).unwrap();
    let ctx = ForwardContext::background().with_timeout(Duration::from_millis(100));

    let request = Request::get("/hang").body(Body::empty()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(2), proxy.forward(&ctx, request))
        .await
        .expect("forward must not hang past its deadline");

    let err = result.unwrap_err();
    assert!(matches!(err, ProxyError::DeadlineExceeded));
    assert!(err.is_cancellation());
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let addr = common::closed_address().await;
    let proxy = HttpServerProxy::new(addr.to_string(), &ProxyConfig::default()).unwrap();

    let request = Request::get("/").body(Body::empty()).unwrap();
    let err = proxy
        .forward(&ForwardContext::background(), request)
        .await
        .unwrap_err();

    assert!(matches!(err, ProxyError::Transport(_)));
    assert!(!err.is_cancellation());
}
