//! Filesystem-backed quota reporting.
//!
//! Used space is the size of `<data_dir>/<user>/files` minus its `Shared`
//! subtree, which holds other users' files. Free space is the user's quota
//! minus used space.

use async_trait::async_trait;
use dashmap::DashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backends::{CollaboratorError, QuotaBackend, StorageUsage};
use crate::config::{AccountConfig, StorageConfig};

/// Quota backend reading usage from per-user file trees.
#[derive(Clone)]
pub struct FsQuotaBackend {
    data_dir: Option<PathBuf>,
    quotas: Arc<DashMap<String, u64>>,
}

impl FsQuotaBackend {
    /// Seed quotas for every configured account.
    pub fn new(storage: &StorageConfig, accounts: &[AccountConfig]) -> Self {
        let quotas = DashMap::new();
        for account in accounts {
            quotas.insert(
                account.username.clone(),
                account.quota_bytes.unwrap_or(storage.default_quota_bytes),
            );
        }
        Self {
            data_dir: storage.data_dir.clone(),
            quotas: Arc::new(quotas),
        }
    }

    /// Current quota of `user`, if the user is known.
    pub fn quota_of(&self, user: &str) -> Option<u64> {
        self.quotas.get(user).map(|q| *q)
    }
}

#[async_trait]
impl QuotaBackend for FsQuotaBackend {
    async fn usage(&self, user: &str) -> Result<StorageUsage, CollaboratorError> {
        let quota = self
            .quota_of(user)
            .ok_or_else(|| CollaboratorError::NotFound(user.to_string()))?;

        let used = match &self.data_dir {
            Some(root) => {
                let files = root.join(user).join("files");
                tokio::task::spawn_blocking(move || {
                    dir_size(&files).saturating_sub(dir_size(&files.join("Shared")))
                })
                .await
                .map_err(|e| CollaboratorError::Unavailable(e.to_string()))?
            }
            None => 0,
        };

        Ok(StorageUsage {
            used,
            free: quota.saturating_sub(used),
        })
    }

    async fn set_quota(&self, user: &str, bytes: u64) -> Result<(), CollaboratorError> {
        match self.quotas.get_mut(user) {
            Some(mut quota) => {
                *quota = bytes;
                tracing::info!(user, quota = bytes, "Quota updated");
                Ok(())
            }
            None => Err(CollaboratorError::NotFound(user.to_string())),
        }
    }
}

/// Total size of regular files below `path`. Missing paths count as empty.
fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(path) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| match entry.metadata() {
            Ok(meta) if meta.is_dir() => dir_size(&entry.path()),
            Ok(meta) if meta.is_file() => meta.len(),
            _ => 0,
        })
        .sum()
}
