//! Gateway plugins: the ingress side of the membrane.
//!
//! # Data Flow
//! ```text
//! startup
//!     → Registry::register(constructor)   (exactly once)
//!     → Registry::start(proxy)            (runs for the process lifetime)
//!         → plugin listener (http.rs | envelope.rs)
//!             → request-id → LoggingLayer → body limit → catch panic
//!             → source adapter builds Trigger
//!             → dispatch.rs (worker permit, deadline, Proxy::forward)
//!             → provider-shaped reply
//! ```
//!
//! # Design Decisions
//! - The registry is an explicit value owned by the composition root
//! - Exactly one plugin per process; the mode selector picks it
//! - Forward failures are contained to their trigger and mapped to statuses
//! - Each plugin bounds in-flight triggers with a semaphore

pub mod dispatch;
pub mod envelope;
pub mod http;
pub mod plugin;
pub mod registry;

pub use dispatch::{DispatchError, Dispatcher};
pub use envelope::EnvelopeGateway;
pub use http::HttpGateway;
pub use plugin::GatewayPlugin;
pub use registry::{Registry, RegistryError};

/// Errors that end a plugin's listen loop.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("gateway server error: {0}")]
    Serve(#[from] std::io::Error),
}
