//! Open Collaboration Services gateway library.

// Core subsystems
pub mod config;
pub mod http;
pub mod ocs;
pub mod routing;

// Collaborators
pub mod backends;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
