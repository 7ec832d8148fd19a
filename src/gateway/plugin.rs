//! The capability set every ingress strategy provides.

use std::sync::Arc;

use async_trait::async_trait;

use crate::gateway::GatewayError;
use crate::proxy::Proxy;

/// A provider-specific ingress strategy.
#[async_trait]
pub trait GatewayPlugin: Send + Sync {
    /// Short name used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// Run the listen loop, forwarding every trigger through `proxy`.
    ///
    /// Returns on graceful shutdown or a fatal listener error.
    async fn start(&self, proxy: Arc<dyn Proxy>) -> Result<(), GatewayError>;

    /// Triggers currently being handled.
    fn worker_count(&self) -> usize;
}
