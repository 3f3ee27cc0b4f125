//! SQLite-backed key/value storage

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::migrations::run_migrations;
use crate::store::KeyValueStore;
use crate::Result;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;

        // WAL keeps readers off the writer's lock
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        tracing::debug!(path = %path.as_ref().display(), "Opened session database");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row("SELECT value FROM entries WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })
    }

    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO entries (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, updated_at],
            )?;
            Ok(())
        })
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM entries WHERE key = ?1", [key])?;
            Ok(())
        })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

// rusqlite blocks, so every call hops onto the blocking pool
#[async_trait]
impl KeyValueStore for Database {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let db = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || db.get(&key)).await?
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let db = self.clone();
        let key = key.to_string();
        let value = value.to_string();
        tokio::task::spawn_blocking(move || db.put(&key, &value)).await?
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let db = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || db.remove(&key)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            let count: i32 =
                conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_put_replaces_value() {
        let db = Database::open_in_memory().unwrap();
        db.put("user_session", "first").unwrap();
        db.put("user_session", "second").unwrap();

        assert_eq!(db.get("user_session").unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_key_value_contract() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(db.read("user_session").await.unwrap(), None);

        db.write("user_session", "{\"token\":\"t\"}").await.unwrap();
        assert_eq!(
            db.read("user_session").await.unwrap().as_deref(),
            Some("{\"token\":\"t\"}")
        );

        db.delete("user_session").await.unwrap();
        assert_eq!(db.read("user_session").await.unwrap(), None);

        // Deleting an absent key is not an error
        db.delete("user_session").await.unwrap();
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warden.db");

        {
            let db = Database::open(&path).unwrap();
            db.write("user_session", "persisted").await.unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(
            db.read("user_session").await.unwrap().as_deref(),
            Some("persisted")
        );
    }
}
