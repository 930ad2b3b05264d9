//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, body buffering)
//!     → request.rs (parameters, path info, host, credentials)
//!     → ocs::Dispatcher (route, handler, serializer)
//!     → response.rs (status, headers, body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{Params, RequestContext, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
