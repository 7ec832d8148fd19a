//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → metrics → child process ready → proxy → register plugin → start
//!
//! Child (child.rs):
//!     spawn command → dial child address until it accepts → supervise
//!
//! Shutdown (shutdown.rs):
//!     Signal or child exit → stop accepting → drain in-flight triggers → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: the function must accept connections before traffic
//! - Fail fast: any startup error is fatal
//! - The child process never outlives the membrane

pub mod child;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use child::{ChildError, ChildProcess};
pub use shutdown::Shutdown;
pub use startup::{run, StartupError};
