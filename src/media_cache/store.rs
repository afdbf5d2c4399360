//! Media record storage and persistence.

use super::models::{CacheStats, MediaRecord};
use super::schema::MEDIA_CACHE_VERSIONED_SCHEMAS;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::info;

/// Errors that can occur against the backing store.
///
/// `OpenFailed` degrades the system to "no caching available"; read and write
/// failures are treated by callers as cache misses, never as fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open media cache: {0}")]
    OpenFailed(String),

    #[error("media cache read failed: {0}")]
    ReadFailed(String),

    #[error("media cache write failed: {0}")]
    WriteFailed(String),
}

/// Trait for media record storage backends.
pub trait MediaStore: Send + Sync {
    /// Get a cached record by media id.
    fn get(&self, id: &str) -> Result<Option<MediaRecord>, StoreError>;

    /// Store a record, overwriting any existing record with the same id
    /// wholesale (last-writer-wins; no merge, no versioning).
    fn put(
        &self,
        id: &str,
        payload: &[u8],
        metadata: &serde_json::Value,
    ) -> Result<(), StoreError>;

    /// Remove every cached record. Returns the number of records removed.
    fn clear(&self) -> Result<usize, StoreError>;

    /// Summary statistics for diagnostics.
    fn stats(&self) -> Result<CacheStats, StoreError>;

    /// Delete oldest records until the total payload size fits within
    /// `max_payload_bytes`. The newest record is always kept so the active
    /// media item stays cached. Returns the number of records removed.
    fn prune_to_budget(&self, max_payload_bytes: u64) -> Result<usize, StoreError>;
}

/// SQLite-backed media store.
pub struct SqliteMediaStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMediaStore {
    /// Open an existing cache database or create a new one with the current
    /// schema. The schema of an existing database is validated before use.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        Self::open_inner(db_path.as_ref()).map_err(|e| StoreError::OpenFailed(format!("{e:#}")))
    }

    fn open_inner(db_path: &Path) -> anyhow::Result<Self> {
        let conn = if db_path.exists() {
            Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .with_context(|| format!("Failed to open media cache at {:?}", db_path))?
        } else {
            let conn = Connection::open(db_path)
                .with_context(|| format!("Failed to create media cache at {:?}", db_path))?;
            MEDIA_CACHE_VERSIONED_SCHEMAS
                .last()
                .context("No schemas defined")?
                .create(&conn)?;
            info!("Created new media cache database at {:?}", db_path);
            conn
        };

        let db_version = conn
            .query_row("PRAGMA user_version;", [], |row| row.get::<usize, i64>(0))
            .context("Failed to read database version")?
            - BASE_DB_VERSION as i64;
        if db_version < 0 {
            bail!(
                "Media cache database version {} predates base version {}; clear the cache to rebuild it",
                db_version + BASE_DB_VERSION as i64,
                BASE_DB_VERSION
            );
        }
        let version = db_version as usize;
        if version >= MEDIA_CACHE_VERSIONED_SCHEMAS.len() {
            bail!(
                "Media cache database version {} is too new (max supported: {}); clear the cache to rebuild it",
                version,
                MEDIA_CACHE_VERSIONED_SCHEMAS.len() - 1
            );
        }

        MEDIA_CACHE_VERSIONED_SCHEMAS
            .get(version)
            .context("Failed to get schema")?
            .validate(&conn)?;

        Ok(SqliteMediaStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store for testing.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        let conn = Connection::open_in_memory().unwrap();
        MEDIA_CACHE_VERSIONED_SCHEMAS
            .last()
            .unwrap()
            .create(&conn)
            .unwrap();
        SqliteMediaStore {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn put_at(
        &self,
        id: &str,
        payload: &[u8],
        metadata: &serde_json::Value,
        cached_at: i64,
    ) -> Result<(), StoreError> {
        let metadata_json = serde_json::to_string(metadata)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"INSERT INTO media_records (id, payload, metadata, cached_at)
               VALUES (?1, ?2, ?3, ?4)
               ON CONFLICT(id) DO UPDATE SET
                   payload = excluded.payload,
                   metadata = excluded.metadata,
                   cached_at = excluded.cached_at"#,
            params![id, payload, metadata_json, cached_at],
        )
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    /// Current timestamp in seconds.
    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

impl MediaStore for SqliteMediaStore {
    fn get(&self, id: &str) -> Result<Option<MediaRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT payload, metadata, cached_at FROM media_records WHERE id = ?1",
                [id],
                |row| {
                    Ok((
                        row.get::<_, Vec<u8>>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        match row {
            None => Ok(None),
            Some((payload, metadata_json, cached_at)) => {
                let metadata = serde_json::from_str(&metadata_json)
                    .map_err(|e| StoreError::ReadFailed(e.to_string()))?;
                Ok(Some(MediaRecord {
                    id: id.to_string(),
                    payload,
                    metadata,
                    cached_at,
                }))
            }
        }
    }

    fn put(
        &self,
        id: &str,
        payload: &[u8],
        metadata: &serde_json::Value,
    ) -> Result<(), StoreError> {
        self.put_at(id, payload, metadata, Self::now())
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock().unwrap();
        let removed = conn
            .execute("DELETE FROM media_records", [])
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        info!("Cleared {} cached media records", removed);
        Ok(removed)
    }

    fn stats(&self) -> Result<CacheStats, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(LENGTH(payload)), 0) FROM media_records",
            [],
            |row| {
                Ok(CacheStats {
                    record_count: row.get::<_, i64>(0)? as usize,
                    total_payload_bytes: row.get::<_, i64>(1)? as u64,
                })
            },
        )
        .map_err(|e| StoreError::ReadFailed(e.to_string()))
    }

    fn prune_to_budget(&self, max_payload_bytes: u64) -> Result<usize, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut removed = 0usize;
        loop {
            let (count, total): (i64, i64) = conn
                .query_row(
                    "SELECT COUNT(*), COALESCE(SUM(LENGTH(payload)), 0) FROM media_records",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .map_err(|e| StoreError::ReadFailed(e.to_string()))?;
            if count <= 1 || total as u64 <= max_payload_bytes {
                break;
            }
            removed += conn
                .execute(
                    r#"DELETE FROM media_records WHERE id IN (
                        SELECT id FROM media_records
                        ORDER BY cached_at ASC, rowid ASC
                        LIMIT 1
                    )"#,
                    [],
                )
                .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        }
        if removed > 0 {
            info!(
                "Pruned {} cached media records to fit {} byte budget",
                removed, max_payload_bytes
            );
        }
        Ok(removed)
    }
}
