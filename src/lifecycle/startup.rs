//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Bring the function process up before any traffic is accepted
//! - Register exactly one gateway plugin and run it
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{MembraneConfig, Mode};
use crate::gateway::{EnvelopeGateway, HttpGateway, Registry, RegistryError};
use crate::lifecycle::child::{self, ChildError, ChildProcess};
use crate::lifecycle::Shutdown;
use crate::observability::metrics::init_metrics;
use crate::proxy::{HttpServerProxy, Proxy, ProxyError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),
    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
    #[error(transparent)]
    Child(#[from] ChildError),
    #[error(transparent)]
    Proxy(#[from] ProxyError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Run the membrane until shutdown.
pub async fn run(config: MembraneConfig, shutdown: Arc<Shutdown>) -> Result<(), StartupError> {
    tracing::info!(
        mode = %config.mode,
        bind_address = %config.gateway.bind_address,
        child_address = %config.child.address,
        max_workers = config.gateway.max_workers,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        init_metrics(addr)?;
    }

    let ready_timeout = Duration::from_secs(config.child.startup_timeout_secs);
    let supervisor = if config.child.command.is_empty() {
        child::wait_for_address(&config.child.address, ready_timeout).await?;
        tracing::info!(address = %config.child.address, "Function reachable");
        None
    } else {
        let mut process = ChildProcess::spawn(&config.child.command)?;
        process.wait_ready(&config.child.address, ready_timeout).await?;
        Some(process.supervise(Arc::clone(&shutdown)))
    };

    let proxy: Arc<dyn Proxy> = Arc::new(HttpServerProxy::new(
        config.child.address.clone(),
        &config.proxy,
    )?);

    let registry = Registry::new();
    register_mode(&registry, &config, &shutdown)?;

    let result = registry.start(proxy).await;

    shutdown.trigger();
    if let Some(supervisor) = supervisor {
        if let Err(e) = supervisor.await {
            tracing::warn!(error = %e, "Child supervisor task failed");
        }
    }

    result?;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Register the plugin selected by the mode.
pub fn register_mode(
    registry: &Registry,
    config: &MembraneConfig,
    shutdown: &Arc<Shutdown>,
) -> Result<(), RegistryError> {
    let gateway = config.gateway.clone();
    let proxy = config.proxy.clone();
    let shutdown = Arc::clone(shutdown);
    match config.mode {
        Mode::Http => registry.register(move || {
            Ok::<_, std::convert::Infallible>(HttpGateway::new(gateway, &proxy, shutdown))
        }),
        Mode::Envelope => registry.register(move || {
            Ok::<_, std::convert::Infallible>(EnvelopeGateway::new(gateway, &proxy, shutdown))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_mode_picks_plugin() {
        let shutdown = Arc::new(Shutdown::new());

        let registry = Registry::new();
        register_mode(&registry, &MembraneConfig::default(), &shutdown).unwrap();
        assert_eq!(registry.plugin().map(|p| p.name()), Some("http"));

        let config = MembraneConfig {
            mode: Mode::Envelope,
            ..MembraneConfig::default()
        };
        let registry = Registry::new();
        register_mode(&registry, &config, &shutdown).unwrap();
        assert_eq!(registry.plugin().map(|p| p.name()), Some("envelope"));

        assert!(matches!(
            register_mode(&registry, &config, &shutdown),
            Err(RegistryError::AlreadyRegistered)
        ));
    }

    #[tokio::test]
    async fn test_run_fails_when_function_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let mut config = MembraneConfig::default();
        config.child.address = address;
        config.child.startup_timeout_secs = 0;

        let err = run(config, Arc::new(Shutdown::new())).await.unwrap_err();
        assert!(matches!(err, StartupError::Child(ChildError::NotReady { .. })));
    }
}
