//! Key-value backing: a set of identifiers held in process memory.
//!
//! Not durable. Reads take a shared lock and copy out a snapshot, so a
//! broadcast never holds the lock across a push.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ConnectionStore;
use crate::error::RelayResult;

#[derive(Debug, Default)]
pub struct MemoryStore {
    ids: RwLock<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionStore for MemoryStore {
    async fn init(&self) -> RelayResult<()> {
        Ok(())
    }

    async fn add(&self, id: &str) -> RelayResult<()> {
        self.ids.write().await.insert(id.to_string());
        Ok(())
    }

    async fn remove(&self, id: &str) -> RelayResult<()> {
        self.ids.write().await.remove(id);
        Ok(())
    }

    async fn list(&self, excluding: Option<&str>) -> RelayResult<Vec<String>> {
        let ids = self.ids.read().await;
        Ok(ids
            .iter()
            .filter(|id| Some(id.as_str()) != excluding)
            .cloned()
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_is_idempotent() {
        let store = MemoryStore::new();
        store.add("a").await.unwrap();
        store.add("a").await.unwrap();
        assert_eq!(store.list(None).await.unwrap(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn remove_unknown_is_ok() {
        let store = MemoryStore::new();
        store.remove("never-added").await.unwrap();
        assert!(store.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_excludes_sender() {
        let store = MemoryStore::new();
        for id in ["a", "b", "c"] {
            store.add(id).await.unwrap();
        }
        let mut ids = store.list(Some("b")).await.unwrap();
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
    }
}
