//! Forwarding to the co-located function process.
//!
//! # Data Flow
//! ```text
//! gateway plugin
//!     → Trigger::into_request (origin-form request)
//!     → Proxy::forward(ctx, request)
//!         → http_server.rs rewrites scheme + authority to the child address
//!         → pooled client call, raced against ctx cancellation / deadline
//!     → raw function response (never redirected, never retried)
//! ```
//!
//! # Design Decisions
//! - One shared client per process; immutable after construction
//! - Redirects are surfaced to the caller as-is
//! - Retries belong to the gateway plugin, not the proxy
//! - Transport errors are returned unwrapped

pub mod context;
pub mod http_server;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};

pub use context::{CancelHandle, ForwardContext};
pub use http_server::HttpServerProxy;

/// Errors returned by [`Proxy::forward`].
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("invalid proxy target `{target}`: {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },
    #[error("invalid forward uri: {0}")]
    InvalidUri(#[from] axum::http::uri::InvalidUriParts),
    #[error(transparent)]
    Transport(#[from] hyper_util::client::legacy::Error),
    #[error("forward canceled")]
    Canceled,
    #[error("forward deadline exceeded")]
    DeadlineExceeded,
}

impl ProxyError {
    /// True for the two context-driven outcomes.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ProxyError::Canceled | ProxyError::DeadlineExceeded)
    }
}

/// Forwards normalized requests to the function process.
#[async_trait]
pub trait Proxy: Send + Sync {
    /// Send `request` to the function and return its raw response.
    ///
    /// Must return promptly once `ctx` is canceled or its deadline passes.
    async fn forward(
        &self,
        ctx: &ForwardContext,
        request: Request<Body>,
    ) -> Result<Response<Body>, ProxyError>;

    /// The configured target, for diagnostics.
    fn host(&self) -> &str;
}
