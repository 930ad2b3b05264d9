//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the bundled collaborators from configuration
//! - Load persisted preferences
//!
//! # Design Decisions
//! - Fail fast: an unreadable preferences file is fatal
//! - The preference store is returned separately so shutdown can save it

use std::sync::Arc;
use std::time::Duration;

use crate::backends::{
    AccountDirectory, Collaborators, FsQuotaBackend, MemoryActivityStore, MemoryPreferenceStore,
};
use crate::config::GatewayConfig;

/// Collaborators plus the handles shutdown needs.
pub struct Services {
    pub collaborators: Collaborators,
    pub preferences: MemoryPreferenceStore,
}

/// Build the reference collaborators described by `config`.
pub fn build_services(config: &GatewayConfig) -> std::io::Result<Services> {
    let directory = Arc::new(AccountDirectory::new(&config.accounts));

    let preferences = match &config.storage.preferences_file {
        Some(path) => MemoryPreferenceStore::load_from_file(path)?,
        None => MemoryPreferenceStore::new(None),
    };

    if config.storage.data_dir.is_none() {
        tracing::warn!("storage.data_dir is not set; quota usage will report zero bytes used");
    }

    let collaborators = Collaborators {
        users: directory.clone(),
        groups: directory.clone(),
        preferences: Arc::new(preferences.clone()),
        quota: Arc::new(FsQuotaBackend::new(&config.storage, &config.accounts)),
        activity: Arc::new(MemoryActivityStore::new()),
        deadline: Duration::from_millis(config.timeouts.collaborator_ms),
    };

    tracing::info!(
        accounts = directory.len(),
        deadline_ms = config.timeouts.collaborator_ms,
        "Collaborators ready"
    );

    Ok(Services {
        collaborators,
        preferences,
    })
}
