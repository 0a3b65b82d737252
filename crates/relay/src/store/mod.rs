//! Connection registry storage.
//!
//! The registry is the set of connection identifiers the relay believes are
//! open. It may briefly hold identifiers whose sockets already went away; the
//! dispatcher evicts those when a push reports them gone.

mod memory;
mod migrations;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, StoreBackend};
use crate::error::RelayResult;

pub use memory::MemoryStore;
pub use migrations::run_migrations;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Ensure the backing structure exists. Safe to call repeatedly.
    async fn init(&self) -> RelayResult<()>;
    /// Register `id`. Already present is a no-op.
    async fn add(&self, id: &str) -> RelayResult<()>;
    /// Deregister `id`. Absent is a no-op success.
    async fn remove(&self, id: &str) -> RelayResult<()>;
    /// Snapshot of registered ids, optionally omitting one. Unordered.
    async fn list(&self, excluding: Option<&str>) -> RelayResult<Vec<String>>;

    fn backend_name(&self) -> &'static str;
}

/// Open the configured backing.
pub fn open_store(config: &Config) -> RelayResult<Arc<dyn ConnectionStore>> {
    match config.store_backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Sqlite => Ok(Arc::new(SqliteStore::open(&config.database_path)?)),
    }
}
