//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Open storage → Load sources → Build store → Start listener
//!
//! Restart (supervisor in main):
//!     Restart request → Shutdown cycle → Rebuild store → Serve again
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: settings first, then store, then listener
//! - Restart is in-process; storage and the notice log outlive a cycle
//! - Ordered shutdown: stop accept, drain, close

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_store, build_store_from_sources, open_storage, StartupError};
