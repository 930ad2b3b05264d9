//! In-memory preference store with optional JSON persistence.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backends::{CollaboratorError, PreferenceStore};

/// app → key → value, sorted so listings are deterministic.
type AppValues = BTreeMap<String, BTreeMap<String, String>>;

/// A thread-safe preference store keyed by user.
#[derive(Clone, Default)]
pub struct MemoryPreferenceStore {
    inner: Arc<DashMap<String, AppValues>>,
    persistence_path: Option<PathBuf>,
}

impl MemoryPreferenceStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
        }
    }

    /// Load from file if it exists; the same file is used by [`Self::save_to_file`].
    pub fn load_from_file(path: &Path) -> std::io::Result<Self> {
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let map: HashMap<String, AppValues> = serde_json::from_reader(reader)?;
            for (user, apps) in map {
                store.inner.insert(user, apps);
            }
            tracing::info!(users = store.inner.len(), path = ?path, "Loaded preferences");
        }
        Ok(store)
    }

    /// Save to the persistence file, if one is configured.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        if let Some(path) = &self.persistence_path {
            let writer = BufWriter::new(File::create(path)?);
            let map: HashMap<_, _> = self
                .inner
                .iter()
                .map(|r| (r.key().clone(), r.value().clone()))
                .collect();
            serde_json::to_writer(writer, &map)?;
            tracing::info!(users = map.len(), path = ?path, "Saved preferences");
        }
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn get_apps(&self, user: &str) -> Result<Vec<String>, CollaboratorError> {
        Ok(self
            .inner
            .get(user)
            .map(|apps| apps.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_keys(&self, user: &str, app: &str) -> Result<Vec<String>, CollaboratorError> {
        Ok(self
            .inner
            .get(user)
            .and_then(|apps| apps.get(app).map(|keys| keys.keys().cloned().collect()))
            .unwrap_or_default())
    }

    async fn get_value(
        &self,
        user: &str,
        app: &str,
        key: &str,
    ) -> Result<Option<String>, CollaboratorError> {
        Ok(self
            .inner
            .get(user)
            .and_then(|apps| apps.get(app).and_then(|keys| keys.get(key).cloned())))
    }

    async fn set_value(
        &self,
        user: &str,
        app: &str,
        key: &str,
        value: &str,
    ) -> Result<(), CollaboratorError> {
        self.inner
            .entry(user.to_string())
            .or_default()
            .entry(app.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_key(&self, user: &str, app: &str, key: &str) -> Result<(), CollaboratorError> {
        if let Some(mut apps) = self.inner.get_mut(user) {
            if let Some(keys) = apps.get_mut(app) {
                keys.remove(key);
                if keys.is_empty() {
                    apps.remove(app);
                }
            }
        }
        Ok(())
    }
}
