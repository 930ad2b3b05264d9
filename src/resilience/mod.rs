//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Handler → collaborator call
//!     → timeouts.rs (per-call deadline, cancellation on expiry)
//!     → Result or CollaboratorError::Timeout
//! ```
//!
//! # Design Decisions
//! - Nothing is retried: every failure is terminal for the current request
//! - The deadline is the only cancellation signal passed to collaborators

pub mod timeouts;

pub use timeouts::with_deadline;
