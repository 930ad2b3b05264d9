//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path info, format parameter)
//!     → router.rs (ordered route lookup)
//!     → matcher.rs (compiled path patterns)
//!     → Return: RouteMatch (operation + placeholder values) or None
//!
//! Route compilation (at startup):
//!     RouteSpec[]
//!     → Tokenize patterns, mark defaulted tail as optional
//!     → Compile one anchored regex per route
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins, in registration order

pub mod matcher;
pub mod router;

pub use matcher::{PathPattern, RouteError};
pub use router::{RouteMatch, RouteMethod, RouteSpec, Router};
