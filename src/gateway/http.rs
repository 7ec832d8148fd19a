//! HTTP listener plugin.
//!
//! # Responsibilities
//! - Accept function traffic on `gateway.bind_address`
//! - Classify each call by its `x-nitric-source-type` header
//! - Forward through the shared dispatcher and reply in HTTP terms
//! - Stop accepting and drain on shutdown

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{HeaderMap, Method, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
    Router,
};
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
};

use crate::config::{GatewayConfig, ProxyConfig};
use crate::gateway::{Dispatcher, GatewayError, GatewayPlugin};
use crate::lifecycle::Shutdown;
use crate::observability::LoggingLayer;
use crate::proxy::Proxy;
use crate::sources::from_http_request;
use crate::trigger::{
    CustomTrigger, Event, SourceType, Trigger, X_NITRIC_REQUEST_ID, X_NITRIC_SOURCE,
    X_NITRIC_SOURCE_TYPE,
};

/// Plugin serving plain HTTP.
#[derive(Debug)]
pub struct HttpGateway {
    config: GatewayConfig,
    forward_timeout: Duration,
    max_response_bytes: usize,
    permits: Arc<Semaphore>,
    shutdown: Arc<Shutdown>,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig, proxy: &ProxyConfig, shutdown: Arc<Shutdown>) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(config.max_workers)),
            forward_timeout: Duration::from_secs(proxy.forward_timeout_secs),
            max_response_bytes: proxy.max_response_bytes,
            config,
            shutdown,
        }
    }

    /// Build the router with the full middleware stack.
    pub fn router(&self, proxy: Arc<dyn Proxy>) -> Router {
        let logging = LoggingLayer::new(self.name(), proxy.host(), self.config.log_result);
        let dispatcher = Dispatcher::new(proxy, Arc::clone(&self.permits), self.forward_timeout)
            .with_response_limit(self.max_response_bytes);

        Router::new()
            .fallback(handle)
            .with_state(dispatcher)
            .layer(CatchPanicLayer::new())
            // the configured limit replaces the extractor default
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(self.config.max_body_bytes))
            .layer(logging)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Serve on an already bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener, proxy: Arc<dyn Proxy>) -> Result<(), GatewayError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, plugin = self.name(), "Gateway listening");

        let app = self.router(proxy);
        let shutdown = Arc::clone(&self.shutdown);
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!(plugin = self.name(), "Gateway stopped");
        Ok(())
    }
}

#[async_trait]
impl GatewayPlugin for HttpGateway {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn start(&self, proxy: Arc<dyn Proxy>) -> Result<(), GatewayError> {
        let listener = TcpListener::bind(&self.config.bind_address)
            .await
            .map_err(|source| GatewayError::Bind {
                address: self.config.bind_address.clone(),
                source,
            })?;
        self.serve(listener, proxy).await
    }

    fn worker_count(&self) -> usize {
        self.config
            .max_workers
            .saturating_sub(self.permits.available_permits())
    }
}

async fn handle(
    State(dispatcher): State<Dispatcher>,
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    // 413 when the body limit is exceeded, 400 for other read failures
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(status = %rejection.status(), error = %rejection, "Failed to read request body");
            return rejection.into_response();
        }
    };

    let mut request = Request::new(body);
    *request.method_mut() = method;
    *request.uri_mut() = uri;
    *request.version_mut() = version;
    *request.headers_mut() = headers;

    match classify(&request) {
        Trigger::Http(http) => dispatcher.handle(Trigger::Http(http)).await.into_response(),
        event => {
            let response = dispatcher.handle(event).await;
            acknowledge(response.status())
        }
    }
}

/// Build the trigger an inbound call represents.
pub fn classify(request: &Request<Bytes>) -> Trigger {
    let source_type =
        header(request, X_NITRIC_SOURCE_TYPE).and_then(|value| value.parse::<SourceType>().ok());
    let id = || {
        header(request, X_NITRIC_REQUEST_ID)
            .map(str::to_owned)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    };
    let source = header(request, X_NITRIC_SOURCE).unwrap_or_default();

    match source_type {
        Some(SourceType::Subscription) => {
            Trigger::Event(Event::new(id(), source, request.body().clone()))
        }
        Some(SourceType::Custom) => {
            Trigger::Custom(CustomTrigger::new(id(), source, request.body().clone()))
        }
        Some(SourceType::Request) | None => Trigger::Http(from_http_request(request)),
    }
}

fn header<'a>(request: &'a Request<Bytes>, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}

/// Event deliveries are acknowledged only when the function succeeded.
fn acknowledge(status: StatusCode) -> Response {
    if status.is_success() {
        (StatusCode::OK, "ok").into_response()
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "event not acknowledged").into_response()
    }
}
