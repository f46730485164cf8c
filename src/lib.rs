//! Layered configuration editor library.

pub mod config;
pub mod form;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;
pub mod tree;

pub use config::schema::EditorSettings;
pub use http::EditorServer;
pub use lifecycle::Shutdown;
pub use store::ConfigStore;
