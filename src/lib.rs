pub mod config;
pub mod envelope;
pub mod error;
pub mod guard;
pub mod media;
pub mod openapi;
pub mod relay;
pub mod routes;
pub mod session;
pub mod upstream;

// Re-export commonly used items for tests / external users
pub use config::ProxyConfig;
pub use routes::AppState;
pub use upstream::{BackendClient, UpstreamRequest};
