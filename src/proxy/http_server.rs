//! Same-host HTTP proxy.
//!
//! # Responsibilities
//! - Point every request at the fixed child address
//! - Keep method, path, query, headers and body untouched
//! - Race the call against the forward context
//!
//! # Design Decisions
//! - The pooled client has no redirect layer, so 3xx responses pass through
//! - Connect timeout from config; overall time bounded by the context

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Response, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::ProxyConfig;
use crate::proxy::{ForwardContext, Proxy, ProxyError};

/// Forwards to a function listening on a local HTTP address.
#[derive(Clone)]
pub struct HttpServerProxy {
    target: String,
    authority: Authority,
    client: Client<HttpConnector, Body>,
}

impl std::fmt::Debug for HttpServerProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServerProxy")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl HttpServerProxy {
    /// Create a proxy for `target` (`host:port`).
    pub fn new(target: impl Into<String>, config: &ProxyConfig) -> Result<Self, ProxyError> {
        let target = target.into();
        let authority = Authority::from_str(&target).map_err(|source| ProxyError::InvalidTarget {
            target: target.clone(),
            source,
        })?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .build(connector);

        Ok(Self {
            target,
            authority,
            client,
        })
    }

    /// Replace scheme and authority with the function's address.
    pub fn rewrite(&self, request: Request<Body>) -> Result<Request<Body>, ProxyError> {
        let (mut parts, body) = request.into_parts();

        let mut uri_parts = std::mem::take(&mut parts.uri).into_parts();
        uri_parts.scheme = Some(Scheme::HTTP);
        uri_parts.authority = Some(self.authority.clone());
        if uri_parts.path_and_query.is_none() {
            uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        parts.uri = Uri::from_parts(uri_parts)?;

        Ok(Request::from_parts(parts, body))
    }
}

#[async_trait]
impl Proxy for HttpServerProxy {
    async fn forward(
        &self,
        ctx: &ForwardContext,
        request: Request<Body>,
    ) -> Result<Response<Body>, ProxyError> {
        if ctx.is_cancelled() {
            return Err(ProxyError::Canceled);
        }

        let request = self.rewrite(request)?;
        tracing::debug!(
            method = %request.method(),
            uri = %request.uri(),
            "Forwarding to function"
        );

        tokio::select! {
            biased;
            reason = ctx.done() => {
                tracing::debug!(target_host = %self.target, reason = %reason, "Forward abandoned");
                Err(reason)
            }
            result = self.client.request(request) => {
                let (parts, body) = result?.into_parts();
                Ok(Response::from_parts(parts, Body::new(body)))
            }
        }
    }

    fn host(&self) -> &str {
        &self.target
    }
}
