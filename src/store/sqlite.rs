/*!
 * SQLite-backed store implementation.
 *
 * This module provides a reference host backend: posts, terms, old-slug
 * metadata and key-value options live in a single SQLite database. Access
 * is async-safe via tokio's spawn_blocking over a mutex-guarded
 * connection.
 */

use async_trait::async_trait;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::errors::StoreError;

use super::{ContentStore, OptionStore, PostRecord, TermRecord};

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "cyrlatin.db";

/// Default database directory name under the user's data directory
const DEFAULT_DB_DIRNAME: &str = "cyrlatin";

/// Post statuses eligible for conversion
const CONVERTIBLE_STATUSES: &str = "'publish', 'future', 'private'";

/// SQLite-backed content and option store
#[derive(Debug, Clone)]
pub struct SqliteStore {
    /// Path to the database file
    db_path: PathBuf,
    /// Thread-safe connection wrapped in Arc<Mutex>
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a store at the default location
    pub fn new_default() -> Result<Self, StoreError> {
        let db_path = Self::default_database_path()?;
        Self::new(&db_path)
    }

    /// Open a store at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Backend(format!("Failed to create database directory {:?}: {}", parent, e))
            })?;
        }

        info!("Opening database at: {:?}", db_path);

        let conn = Connection::open(&db_path)?;
        initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store (for testing)
    pub fn new_in_memory() -> Result<Self, StoreError> {
        debug!("Creating in-memory database");

        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the default database path
    pub fn default_database_path() -> Result<PathBuf, StoreError> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| StoreError::Backend("Could not determine data directory".to_string()))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Execute a database operation with the connection
    pub fn execute<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self
            .connection
            .lock()
            .map_err(|e| StoreError::Backend(format!("Failed to acquire database lock: {}", e)))?;

        f(&conn)
    }

    /// Execute a database operation asynchronously using spawn_blocking.
    ///
    /// This is the preferred method for async contexts as it prevents
    /// blocking the async runtime.
    pub async fn execute_async<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|e| {
                StoreError::Backend(format!("Failed to acquire database lock: {}", e))
            })?;

            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("Database task panicked: {}", e)))?
    }

    /// Seed a post row (host-side API, used by tests and fixtures)
    pub fn insert_post(&self, id: i64, slug: &str, status: &str) -> Result<(), StoreError> {
        self.execute(|conn| {
            conn.execute(
                "INSERT INTO posts (id, slug, status) VALUES (?1, ?2, ?3)",
                params![id, slug, status],
            )?;
            Ok(())
        })
    }

    /// Seed a term row (host-side API, used by tests and fixtures)
    pub fn insert_term(&self, id: i64, taxonomy: &str, slug: &str) -> Result<(), StoreError> {
        self.execute(|conn| {
            conn.execute(
                "INSERT INTO terms (id, taxonomy, slug) VALUES (?1, ?2, ?3)",
                params![id, taxonomy, slug],
            )?;
            Ok(())
        })
    }

    /// Old slugs recorded for a post, oldest first
    pub fn old_post_slugs(&self, id: i64) -> Result<Vec<String>, StoreError> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT old_slug FROM post_meta WHERE post_id = ?1 ORDER BY rowid ASC",
            )?;
            let rows = stmt.query_map([id], |row| row.get::<_, String>(0))?;

            let mut slugs = Vec::new();
            for row in rows {
                slugs.push(row?);
            }
            Ok(slugs)
        })
    }
}

/// Initialize the database schema
fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY,
            slug TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'publish'
        );

        CREATE TABLE IF NOT EXISTS terms (
            id INTEGER PRIMARY KEY,
            taxonomy TEXT NOT NULL,
            slug TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS post_meta (
            post_id INTEGER NOT NULL,
            old_slug TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS options (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_post_meta_post_id ON post_meta (post_id);
        "#,
    )?;

    Ok(())
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn fetch_posts(&self, limit: usize, offset: u64) -> Result<Vec<PostRecord>, StoreError> {
        self.execute_async(move |conn| {
            let sql = format!(
                "SELECT id, slug FROM posts WHERE status IN ({}) ORDER BY id ASC LIMIT ?1 OFFSET ?2",
                CONVERTIBLE_STATUSES
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![limit as i64, offset as i64], |row| {
                Ok(PostRecord {
                    id: row.get(0)?,
                    slug: row.get(1)?,
                })
            })?;

            let mut posts = Vec::new();
            for row in rows {
                posts.push(row?);
            }
            Ok(posts)
        })
        .await
    }

    async fn update_post_slug(&self, id: i64, new_slug: &str) -> Result<(), StoreError> {
        let new_slug = new_slug.to_string();

        self.execute_async(move |conn| {
            let updated = conn.execute(
                "UPDATE posts SET slug = ?1 WHERE id = ?2",
                params![new_slug, id],
            )?;

            if updated == 0 {
                return Err(StoreError::NotFound(format!("post {}", id)));
            }
            Ok(())
        })
        .await
    }

    async fn record_old_post_slug(&self, id: i64, old_slug: &str) -> Result<(), StoreError> {
        let old_slug = old_slug.to_string();

        self.execute_async(move |conn| {
            conn.execute(
                "INSERT INTO post_meta (post_id, old_slug) VALUES (?1, ?2)",
                params![id, old_slug],
            )?;
            Ok(())
        })
        .await
    }

    async fn fetch_terms(&self, limit: usize, offset: u64) -> Result<Vec<TermRecord>, StoreError> {
        self.execute_async(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, taxonomy, slug FROM terms ORDER BY id ASC LIMIT ?1 OFFSET ?2",
            )?;
            let rows = stmt.query_map(params![limit as i64, offset as i64], |row| {
                Ok(TermRecord {
                    id: row.get(0)?,
                    taxonomy: row.get(1)?,
                    slug: row.get(2)?,
                })
            })?;

            let mut terms = Vec::new();
            for row in rows {
                terms.push(row?);
            }
            Ok(terms)
        })
        .await
    }

    async fn update_term_slug(
        &self,
        id: i64,
        taxonomy: &str,
        new_slug: &str,
    ) -> Result<(), StoreError> {
        let taxonomy = taxonomy.to_string();
        let new_slug = new_slug.to_string();

        self.execute_async(move |conn| {
            let updated = conn.execute(
                "UPDATE terms SET slug = ?1 WHERE id = ?2 AND taxonomy = ?3",
                params![new_slug, id, taxonomy],
            )?;

            if updated == 0 {
                return Err(StoreError::NotFound(format!("term {} ({})", id, taxonomy)));
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl OptionStore for SqliteStore {
    async fn get_option(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let key = key.to_string();

        self.execute_async(move |conn| {
            let raw: Option<String> = conn
                .query_row("SELECT value FROM options WHERE key = ?1", [&key], |row| {
                    row.get(0)
                })
                .optional()?;

            match raw {
                Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn set_option(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        let key = key.to_string();

        self.execute_async(move |conn| {
            let raw = serde_json::to_string(&value)?;
            conn.execute(
                "INSERT OR REPLACE INTO options (key, value) VALUES (?1, ?2)",
                params![key, raw],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete_option(&self, key: &str) -> Result<(), StoreError> {
        let key = key.to_string();

        self.execute_async(move |conn| {
            conn.execute("DELETE FROM options WHERE key = ?1", [&key])?;
            Ok(())
        })
        .await
    }
}
