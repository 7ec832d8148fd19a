//! One-shot plugin registration.

use std::sync::{Arc, Mutex, PoisonError};

use crate::gateway::{GatewayError, GatewayPlugin};
use crate::proxy::Proxy;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("a gateway plugin is already registered")]
    AlreadyRegistered,
    #[error("no gateway plugin registered")]
    NotRegistered,
    #[error("gateway plugin construction failed: {0}")]
    Construction(#[source] BoxError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Holds the single gateway plugin of this process.
///
/// The slot goes from empty to occupied once and is never reset.
#[derive(Default)]
pub struct Registry {
    slot: Mutex<Option<Arc<dyn GatewayPlugin>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a plugin with `constructor` and store it.
    ///
    /// The constructor only runs when the slot is empty.
    pub fn register<P, E, F>(&self, constructor: F) -> Result<(), RegistryError>
    where
        P: GatewayPlugin + 'static,
        E: Into<BoxError>,
        F: FnOnce() -> Result<P, E>,
    {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(RegistryError::AlreadyRegistered);
        }

        let plugin = constructor().map_err(|e| RegistryError::Construction(e.into()))?;
        tracing::info!(plugin = plugin.name(), "Gateway plugin registered");
        *slot = Some(Arc::new(plugin));
        Ok(())
    }

    /// The registered plugin, if any.
    pub fn plugin(&self) -> Option<Arc<dyn GatewayPlugin>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run the registered plugin until it stops.
    pub async fn start(&self, proxy: Arc<dyn Proxy>) -> Result<(), RegistryError> {
        let plugin = self.plugin().ok_or(RegistryError::NotRegistered)?;
        tracing::info!(plugin = plugin.name(), target_host = %proxy.host(), "Starting gateway");
        plugin.start(proxy).await?;
        Ok(())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let plugin = self.plugin().map(|plugin| plugin.name());
        f.debug_struct("Registry").field("plugin", &plugin).finish()
    }
}
