//! External collaborators.
//!
//! # Data Flow
//! ```text
//! Handler
//!     → resilience::with_deadline (per-call deadline)
//!     → one of the narrow traits below
//!     → reference implementation (accounts.rs, preferences.rs, quota.rs, activity.rs)
//!       or any host-provided implementation
//! ```
//!
//! # Design Decisions
//! - The OCS core owns no durable state; everything lives behind these traits
//! - Traits are object-safe (`async_trait`) so the dispatcher holds `Arc<dyn _>`
//! - Implementations do their own locking; the core adds none

pub mod accounts;
pub mod activity;
pub mod preferences;
pub mod quota;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use accounts::AccountDirectory;
pub use activity::MemoryActivityStore;
pub use preferences::MemoryPreferenceStore;
pub use quota::FsQuotaBackend;

/// Failure reported by a collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The addressed user or record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend could not serve the call.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The call did not finish before its deadline.
    #[error("{operation} timed out after {after_ms}ms")]
    Timeout { operation: &'static str, after_ms: u64 },
}

/// Verifies credentials and answers account existence.
#[async_trait]
pub trait UserBackend: Send + Sync {
    /// Returns true when `password` is valid for `username`.
    async fn check_password(&self, username: &str, password: &str)
        -> Result<bool, CollaboratorError>;

    async fn user_exists(&self, username: &str) -> Result<bool, CollaboratorError>;
}

/// Answers group membership questions.
#[async_trait]
pub trait GroupBackend: Send + Sync {
    async fn in_group(&self, username: &str, group: &str) -> Result<bool, CollaboratorError>;
}

/// Per-user, per-app key/value preference store.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Apps for which `user` has at least one key.
    async fn get_apps(&self, user: &str) -> Result<Vec<String>, CollaboratorError>;

    async fn get_keys(&self, user: &str, app: &str) -> Result<Vec<String>, CollaboratorError>;

    async fn get_value(
        &self,
        user: &str,
        app: &str,
        key: &str,
    ) -> Result<Option<String>, CollaboratorError>;

    async fn set_value(
        &self,
        user: &str,
        app: &str,
        key: &str,
        value: &str,
    ) -> Result<(), CollaboratorError>;

    async fn delete_key(&self, user: &str, app: &str, key: &str) -> Result<(), CollaboratorError>;
}

/// Storage usage of a user's file tree, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageUsage {
    pub used: u64,
    pub free: u64,
}

/// Reports and adjusts storage quotas.
#[async_trait]
pub trait QuotaBackend: Send + Sync {
    async fn usage(&self, user: &str) -> Result<StorageUsage, CollaboratorError>;

    async fn set_quota(&self, user: &str, bytes: u64) -> Result<(), CollaboratorError>;
}

/// A single published activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: String,
    pub personid: String,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    pub message: String,
}

/// One page of a user's activity, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityPage {
    /// Number of entries across all pages.
    pub total: usize,
    pub entries: Vec<ActivityEntry>,
}

/// Per-user activity log.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn publish(&self, user: &str, message: &str) -> Result<(), CollaboratorError>;

    /// Returns page `page` (zero based) of `page_size` entries.
    async fn page(
        &self,
        user: &str,
        page: usize,
        page_size: usize,
    ) -> Result<ActivityPage, CollaboratorError>;
}

/// The full set of collaborators a dispatcher talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub users: Arc<dyn UserBackend>,
    pub groups: Arc<dyn GroupBackend>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub quota: Arc<dyn QuotaBackend>,
    pub activity: Arc<dyn ActivityStore>,
    /// Deadline applied to every call.
    pub deadline: Duration,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
