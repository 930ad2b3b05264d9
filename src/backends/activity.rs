//! In-memory activity log.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::backends::{ActivityEntry, ActivityPage, ActivityStore, CollaboratorError};

/// Per-user activity log kept in insertion order.
#[derive(Clone, Default)]
pub struct MemoryActivityStore {
    inner: Arc<DashMap<String, Vec<ActivityEntry>>>,
}

impl MemoryActivityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityStore for MemoryActivityStore {
    async fn publish(&self, user: &str, message: &str) -> Result<(), CollaboratorError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.inner
            .entry(user.to_string())
            .or_default()
            .push(ActivityEntry {
                id: Uuid::new_v4().to_string(),
                personid: user.to_string(),
                timestamp,
                message: message.to_string(),
            });
        Ok(())
    }

    async fn page(
        &self,
        user: &str,
        page: usize,
        page_size: usize,
    ) -> Result<ActivityPage, CollaboratorError> {
        let Some(log) = self.inner.get(user) else {
            return Ok(ActivityPage::default());
        };
        let entries = log
            .iter()
            .rev()
            .skip(page.saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect();
        Ok(ActivityPage {
            total: log.len(),
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pages_newest_first() {
        let store = MemoryActivityStore::new();
        for i in 0..5 {
            store.publish("alice", &format!("m{i}")).await.unwrap();
        }

        let first = store.page("alice", 0, 2).await.unwrap();
        assert_eq!(first.total, 5);
        let messages: Vec<_> = first.entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["m4", "m3"]);

        let last = store.page("alice", 2, 2).await.unwrap();
        assert_eq!(last.entries.len(), 1);
        assert_eq!(last.entries[0].message, "m0");
        assert_eq!(last.entries[0].personid, "alice");

        assert!(store.page("alice", 9, 2).await.unwrap().entries.is_empty());
        assert_eq!(store.page("bob", 0, 10).await.unwrap(), ActivityPage::default());
    }
}
