//! Relational backing: one `connections` table keyed by identifier.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection};

use super::{run_migrations, ConnectionStore};
use crate::error::{RelayError, RelayResult};

/// Sqlite connection wrapper.
pub struct SqliteStore(Mutex<Connection>);

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> RelayResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                RelayError::Persistence(format!("create {}: {}", parent.display(), e))
            })?;
        }
        let conn = Connection::open(path)?;
        Ok(Self(Mutex::new(conn)))
    }

    pub fn open_in_memory() -> RelayResult<Self> {
        Ok(Self(Mutex::new(Connection::open_in_memory()?)))
    }

    fn conn(&self) -> RelayResult<MutexGuard<'_, Connection>> {
        self.0
            .lock()
            .map_err(|_| RelayError::Persistence("sqlite connection lock poisoned".to_string()))
    }
}

#[async_trait]
impl ConnectionStore for SqliteStore {
    async fn init(&self) -> RelayResult<()> {
        run_migrations(&*self.conn()?)
    }

    async fn add(&self, id: &str) -> RelayResult<()> {
        self.conn()?.execute(
            "INSERT OR IGNORE INTO connections (connection_id) VALUES (?1)",
            params![id],
        )?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> RelayResult<()> {
        self.conn()?.execute(
            "DELETE FROM connections WHERE connection_id = ?1",
            params![id],
        )?;
        Ok(())
    }

    async fn list(&self, excluding: Option<&str>) -> RelayResult<Vec<String>> {
        let conn = self.conn()?;
        let ids = match excluding {
            Some(sender) => {
                let mut stmt = conn
                    .prepare("SELECT connection_id FROM connections WHERE connection_id != ?1")?;
                let rows = stmt.query_map([sender], |row| row.get::<_, String>(0))?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare("SELECT connection_id FROM connections")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(ids)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
