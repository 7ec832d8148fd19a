//! Trigger logging middleware.
//!
//! # Responsibilities
//! - Emit one `trigger received` line before the wrapped handler runs
//! - Emit one `trigger handled` line afterwards, when result logging is on
//! - Record trigger metrics
//!
//! # Design Decisions
//! - The status is read from the response value the handler returns, so the
//!   first status the handler settles on is the one logged (200 if untouched)
//! - Purely observational: requests, responses and errors pass through as-is

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::http::{Request, Response};
use tower::{Layer, Service};

use crate::observability::metrics::record_trigger;

const X_REQUEST_ID: &str = "x-request-id";

#[derive(Debug)]
struct Labels {
    source: String,
    target: String,
}

/// Layer that wraps a handler with [`LoggingService`].
#[derive(Debug, Clone)]
pub struct LoggingLayer {
    labels: Arc<Labels>,
    log_result: bool,
}

impl LoggingLayer {
    pub fn new(source: impl Into<String>, target: impl Into<String>, log_result: bool) -> Self {
        Self {
            labels: Arc::new(Labels {
                source: source.into(),
                target: target.into(),
            }),
            log_result,
        }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingService {
            inner,
            labels: Arc::clone(&self.labels),
            log_result: self.log_result,
        }
    }
}

/// Service produced by [`LoggingLayer`].
#[derive(Debug, Clone)]
pub struct LoggingService<S> {
    inner: S,
    labels: Arc<Labels>,
    log_result: bool,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for LoggingService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let labels = Arc::clone(&self.labels);
        let log_result = self.log_result;

        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");
        tracing::info!(
            source = %labels.source,
            target_host = %labels.target,
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id,
            "trigger received"
        );

        let start = Instant::now();
        // The ready service is the one that must be called.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let result = inner.call(request).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(response) => {
                    let status = response.status().as_u16();
                    record_trigger(&labels.source, status, elapsed);
                    if log_result {
                        tracing::info!(
                            source = %labels.source,
                            target_host = %labels.target,
                            status,
                            elapsed_ms = elapsed.as_millis() as u64,
                            "trigger handled"
                        );
                    }
                }
                Err(_) if log_result => {
                    tracing::warn!(
                        source = %labels.source,
                        target_host = %labels.target,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "trigger handler failed"
                    );
                }
                Err(_) => {}
            }

            result
        })
    }
}
