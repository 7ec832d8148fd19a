//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment overrides (loader.rs)
//!     → validation.rs (semantic checks, all errors reported)
//!     → MembraneConfig (validated, immutable)
//!     → handed by value to lifecycle::startup
//! ```
//!
//! # Design Decisions
//! - Read once at process start; no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{resolve_config, ConfigError};
pub use schema::{
    ChildConfig, GatewayConfig, LogFormat, MembraneConfig, Mode, ObservabilityConfig, ProxyConfig,
};
pub use validation::{validate_config, ValidationError};
