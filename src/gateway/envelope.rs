//! Event-envelope plugin.
//!
//! Serves the serverless-runtime style where every invocation is a JSON
//! envelope POSTed to the membrane and the reply is a JSON document the
//! provider understands.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use base64::Engine;
use bytes::Bytes;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
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
use crate::sources::{parse_envelope, Envelope};
use crate::trigger::{HttpResponse, Trigger};

/// Reply shape for HTTP envelopes.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl ProxyResponse {
    pub fn from_response(response: &HttpResponse) -> Self {
        Self {
            status_code: response.status_code(),
            headers: flatten(response.headers()),
            body: base64::engine::general_purpose::STANDARD.encode(response.body()),
            is_base64_encoded: true,
        }
    }
}

fn flatten(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_owned(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

/// Negative acknowledgment listing the events to redeliver.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchFailure {
    failed_ids: Vec<String>,
}

/// Plugin serving provider event envelopes.
#[derive(Debug)]
pub struct EnvelopeGateway {
    config: GatewayConfig,
    forward_timeout: Duration,
    max_response_bytes: usize,
    permits: Arc<Semaphore>,
    shutdown: Arc<Shutdown>,
}

impl EnvelopeGateway {
    pub fn new(config: GatewayConfig, proxy: &ProxyConfig, shutdown: Arc<Shutdown>) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(config.max_workers)),
            forward_timeout: Duration::from_secs(proxy.forward_timeout_secs),
            max_response_bytes: proxy.max_response_bytes,
            config,
            shutdown,
        }
    }

    pub fn router(&self, proxy: Arc<dyn Proxy>) -> Router {
        let logging = LoggingLayer::new(self.name(), proxy.host(), self.config.log_result);
        let dispatcher = Dispatcher::new(proxy, Arc::clone(&self.permits), self.forward_timeout)
            .with_response_limit(self.max_response_bytes);

        Router::new()
            .route("/", post(handle))
            .route("/{*path}", post(handle))
            .with_state(dispatcher)
            .layer(CatchPanicLayer::new())
            // the configured limit replaces the extractor default
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(self.config.max_body_bytes))
            .layer(logging)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

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
impl GatewayPlugin for EnvelopeGateway {
    fn name(&self) -> &'static str {
        "envelope"
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

async fn handle(State(dispatcher): State<Dispatcher>, body: Bytes) -> Response {
    let envelope = match parse_envelope(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected envelope");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    match envelope {
        Envelope::HealthCheck => (StatusCode::OK, Json(serde_json::json!({}))).into_response(),
        Envelope::Http(request) => {
            let response = dispatcher.handle(Trigger::Http(request)).await;
            Json(ProxyResponse::from_response(&response)).into_response()
        }
        Envelope::Events(events) => {
            let failed_ids = deliver(&dispatcher, events).await;
            if failed_ids.is_empty() {
                (StatusCode::OK, Json(serde_json::json!({}))).into_response()
            } else {
                let failure = BatchFailure { failed_ids };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(failure)).into_response()
            }
        }
    }
}

/// Forward a batch concurrently; returns the ids that were not acknowledged.
async fn deliver(dispatcher: &Dispatcher, events: Vec<Trigger>) -> Vec<String> {
    let mut tasks = JoinSet::new();
    let mut ids = HashMap::new();
    for event in events {
        let dispatcher = dispatcher.clone();
        let id = event.id().unwrap_or_default().to_owned();
        let handle = tasks.spawn(async move {
            dispatcher
                .forward(event)
                .await
                .map(|response| response.status().is_success())
                .unwrap_or(false)
        });
        ids.insert(handle.id(), id);
    }

    let mut failed = Vec::new();
    while let Some(joined) = tasks.join_next_with_id().await {
        let (task, acked) = match joined {
            Ok((task, acked)) => (task, acked),
            Err(e) => {
                tracing::error!(error = %e, "Event delivery task failed");
                (e.id(), false)
            }
        };
        if !acked {
            failed.extend(ids.remove(&task));
        }
    }
    failed.sort();
    failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_proxy_response_shape() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        let response = HttpResponse::new(StatusCode::ACCEPTED, headers, "hi");

        let json = serde_json::to_value(ProxyResponse::from_response(&response)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "statusCode": 202,
                "headers": {"content-type": "text/plain"},
                "body": "aGk=",
                "isBase64Encoded": true
            })
        );
    }
}
