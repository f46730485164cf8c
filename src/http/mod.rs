//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request ID, trace span, timeout, body limit)
//!     → auth.rs (bearer token when configured)
//!     → handlers.rs (lock store, call one store operation)
//!     → error.rs (StoreError → status code + JSON body)
//!     → Send to client
//! ```

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use handlers::{StatusResponse, SubmitRequest};
pub use server::{AppState, EditorServer, X_REQUEST_ID};
