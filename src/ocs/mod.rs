//! OCS request engine.
//!
//! # Data Flow
//! ```text
//! RequestContext
//!     → dispatcher.rs (route lookup, 999 fallback)
//!     → handlers.rs (one function per operation)
//!         → params.rs (read + coerce parameters)
//!         → auth.rs (Basic credentials → Identity)
//!         → backends (one collaborator call, under a deadline)
//!     → envelope.rs + payload.rs (status, metadata, data)
//!     → serializer.rs (XML or JSON)
//!     → OcsResponse
//! ```
//!
//! # Design Decisions
//! - Handlers return envelopes; only the dispatcher renders
//! - Transport-level rejections (400, 401) are errors, not envelopes
//! - Payloads are a closed sum type walked by exhaustive matches

pub mod auth;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod params;
pub mod payload;
pub mod serializer;

pub use auth::{Authenticator, Credentials, Identity};
pub use dispatcher::{Dispatcher, OcsResponse};
pub use envelope::{Dimension, Envelope, Status};
pub use error::OcsReject;
pub use handlers::{Handlers, Operation};
pub use payload::{Payload, Scalar};
pub use serializer::{Format, ResponseSerializer};
