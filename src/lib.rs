//! Membrane library: ingress sidecar for serverless functions.

pub mod config;
pub mod gateway;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod sources;
pub mod trigger;

pub use config::MembraneConfig;
pub use gateway::{GatewayPlugin, Registry};
pub use lifecycle::Shutdown;
pub use proxy::{HttpServerProxy, Proxy};
pub use trigger::Trigger;
