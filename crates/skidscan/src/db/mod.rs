//! Database module for persistent storage.
//!
//! Uses rusqlite (SQLite) with a thread-safe `Database` handle.
//! All access is serialized through a `Mutex<Connection>`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;

pub mod error;
pub mod gateway;
pub mod migrations;
pub mod record_repo;

pub use error::DatabaseError;
pub use gateway::{PersistenceGateway, SqliteGateway};
pub use record_repo::{InferenceRecordRow, NewInferenceRecord};

/// Thread-safe database handle wrapping a single rusqlite connection.
///
/// Cloning is cheap (inner `Arc`). All access is serialized through
/// a `Mutex`, which is fine for SQLite (which serializes writes anyway).
/// WAL mode is enabled for concurrent read performance.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database at the given path and runs all
    /// pending migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        log::info!("Database opened at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Bounded-retry wrapper around [`Database::open`], for deployments where
    /// the database file lives on storage that comes up after the service.
    pub fn open_with_retry(
        path: &Path,
        attempts: u32,
        delay: Duration,
    ) -> Result<Self, DatabaseError> {
        let mut last_err = None;

        for attempt in 1..=attempts.max(1) {
            match Self::open(path) {
                Ok(db) => return Ok(db),
                Err(e) => {
                    log::warn!(
                        "Database open attempt {}/{} failed: {}",
                        attempt,
                        attempts.max(1),
                        e
                    );
                    last_err = Some(e);
                    if attempt < attempts.max(1) {
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        Err(last_err.expect("at least one open attempt"))
    }

    /// Opens an in-memory database for testing. Runs all migrations.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Provides locked access to the underlying connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

/// Returns the canonical database path: `~/.skidscan/data/skidscan.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".skidscan").join("data").join("skidscan.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let count: u32 =
                conn.query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))?;
            assert!(count > 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_open_file_db() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(&path).unwrap();
        db.with_conn(|conn| {
            let count: u32 =
                conn.query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))?;
            assert!(count > 0);
            Ok(())
        })
        .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_open_with_retry_succeeds_first_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retry.db");
        let db = Database::open_with_retry(&path, 3, Duration::from_millis(1)).unwrap();
        db.with_conn(|_conn| Ok(())).unwrap();
    }

    #[test]
    fn test_open_with_retry_exhausts_attempts() {
        // A directory path cannot be opened as a database file.
        let dir = tempfile::tempdir().unwrap();
        let result = Database::open_with_retry(dir.path(), 2, Duration::from_millis(1));
        assert!(result.is_err());
    }

    #[test]
    fn test_default_database_path() {
        let path = default_database_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.ends_with("skidscan.db"));
        assert!(path.to_string_lossy().contains(".skidscan"));
    }

    #[test]
    fn test_database_is_clone() {
        let db = Database::open_in_memory().unwrap();
        let db2 = db.clone();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO inference_records (image_name, exclusion, tenant_id, created_at)
                 VALUES ('a.jpg', '', 't1', '2026-01-01T00:00:00Z')",
                [],
            )?;
            Ok(())
        })
        .unwrap();
        db2.with_conn(|conn| {
            let count: u32 =
                conn.query_row("SELECT COUNT(*) FROM inference_records", [], |r| r.get(0))?;
            assert_eq!(count, 1);
            Ok(())
        })
        .unwrap();
    }
}
