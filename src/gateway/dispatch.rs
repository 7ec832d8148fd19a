//! Shared forwarding pipeline used by every gateway plugin.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use tokio::sync::Semaphore;

use crate::observability::metrics::record_forward_failure;
use crate::proxy::{ForwardContext, Proxy, ProxyError};
use crate::sources::from_http_response_limited;
use crate::trigger::{HttpResponse, Trigger};

/// Why a trigger produced no function response.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to build outbound request: {0}")]
    Request(#[from] axum::http::Error),
    #[error(transparent)]
    Proxy(#[from] ProxyError),
    #[error("failed to read function response: {0}")]
    Body(#[source] axum::Error),
    #[error("gateway is shutting down")]
    Closed,
}

impl DispatchError {
    /// Status reported to the origin for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::Proxy(ProxyError::DeadlineExceeded) => StatusCode::GATEWAY_TIMEOUT,
            DispatchError::Request(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::Closed => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::Proxy(_) | DispatchError::Body(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            DispatchError::Request(_) => "request",
            DispatchError::Proxy(ProxyError::DeadlineExceeded) => "deadline",
            DispatchError::Proxy(ProxyError::Canceled) => "canceled",
            DispatchError::Proxy(_) => "transport",
            DispatchError::Body(_) => "body",
            DispatchError::Closed => "closed",
        }
    }

    /// Plain-text reply carrying this failure.
    pub fn into_response(self) -> HttpResponse {
        HttpResponse::text(self.status(), self.to_string())
    }
}

/// Largest function response body read unless configured otherwise.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 6 * 1024 * 1024;

/// Forwards triggers to the function, one worker permit per trigger.
#[derive(Clone)]
pub struct Dispatcher {
    proxy: Arc<dyn Proxy>,
    permits: Arc<Semaphore>,
    forward_timeout: Duration,
    max_response_bytes: usize,
}

impl Dispatcher {
    pub fn new(proxy: Arc<dyn Proxy>, permits: Arc<Semaphore>, forward_timeout: Duration) -> Self {
        Self {
            proxy,
            permits,
            forward_timeout,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }

    /// Cap the function response body; larger bodies fail the trigger.
    pub fn with_response_limit(mut self, max_response_bytes: usize) -> Self {
        self.max_response_bytes = max_response_bytes;
        self
    }

    /// Forward one trigger and normalize the function's answer.
    pub async fn forward(&self, trigger: Trigger) -> Result<HttpResponse, DispatchError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| DispatchError::Closed)?;

        let source = trigger.source_type();
        let id = trigger.id().map(str::to_owned);
        let ctx = ForwardContext::background().with_timeout(self.forward_timeout);

        let result = self.forward_inner(&ctx, trigger).await;
        if let Err(e) = &result {
            record_forward_failure(e.kind());
            tracing::error!(
                source = %source,
                trigger_id = id.as_deref().unwrap_or("-"),
                target_host = %self.proxy.host(),
                error = %e,
                "Failed to forward trigger"
            );
        }
        result
    }

    /// Like [`forward`](Self::forward), with failures turned into replies.
    pub async fn handle(&self, trigger: Trigger) -> HttpResponse {
        self.forward(trigger)
            .await
            .unwrap_or_else(DispatchError::into_response)
    }

    /// The deadline covers the whole exchange, body read included.
    async fn forward_inner(
        &self,
        ctx: &ForwardContext,
        trigger: Trigger,
    ) -> Result<HttpResponse, DispatchError> {
        tokio::select! {
            biased;
            reason = ctx.done() => Err(DispatchError::Proxy(reason)),
            result = self.exchange(ctx, trigger) => result,
        }
    }

    async fn exchange(
        &self,
        ctx: &ForwardContext,
        trigger: Trigger,
    ) -> Result<HttpResponse, DispatchError> {
        let request = trigger.into_request()?;
        let response = self.proxy.forward(ctx, request).await?;
        from_http_response_limited(response, self.max_response_bytes)
            .await
            .map_err(DispatchError::Body)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("target", &self.proxy.host())
            .field("available_permits", &self.permits.available_permits())
            .field("forward_timeout", &self.forward_timeout)
            .field("max_response_bytes", &self.max_response_bytes)
            .finish()
    }
}
