//! Durable thumbnail sink backed by a relational table.
//!
//! The pipeline only ever writes; the read helpers on `SqliteStore` exist for
//! the CLI and for tests.

use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection};
use std::path::Path;
use std::time::Duration;

use crate::config::StoreConfig;
use crate::error::StoreError;

/// A resized image on its way into the store.
#[derive(Debug, Clone)]
pub struct StoredImage {
    /// Destination file name. Not required to be unique.
    pub name: String,
    /// Encoded thumbnail bytes
    pub bytes: Vec<u8>,
}

/// Write-only sink for thumbnails.
///
/// Implementations must accept concurrent `put` calls from every worker.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Create the backing table if it does not exist. Safe to call every run.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Persist one image as a new row, returning its id.
    async fn put(&self, image: StoredImage) -> Result<i64, StoreError>;
}

const CREATE_IMAGES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS images (
        id       INTEGER PRIMARY KEY AUTOINCREMENT,
        filename TEXT NOT NULL,
        data     BLOB NOT NULL
    );
"#;

/// How long a connection waits on a locked database before failing a write.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// SQLite store behind an r2d2 connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`.
    pub fn open(path: &Path, pool_size: u32) -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));
        let pool = Pool::builder().max_size(pool_size).build(manager)?;
        tracing::debug!("Opened SQLite store at {:?} (pool size {})", path, pool_size);
        Ok(Self { pool })
    }

    /// Open using the `[store]` section. The caller resolves the path.
    pub fn from_config(path: &Path, config: &StoreConfig) -> Result<Self, StoreError> {
        Self::open(path, config.pool_size)
    }

    /// Run a closure on a pooled connection off the async runtime.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&*conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// Total number of stored images.
    pub async fn count(&self) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))?;
            Ok(n as u64)
        })
        .await
    }

    /// Number of stored images with the given file name.
    pub async fn count_named(&self, name: &str) -> Result<u64, StoreError> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM images WHERE filename = ?1",
                params![name],
                |row| row.get(0),
            )?;
            Ok(n as u64)
        })
        .await
    }

    /// Bytes of every row stored under `name`, oldest first.
    pub async fn load(&self, name: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let mut stmt =
                conn.prepare("SELECT data FROM images WHERE filename = ?1 ORDER BY id")?;
            let rows = stmt
                .query_map(params![name], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }
}

#[async_trait]
impl ImageStore for SqliteStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(CREATE_IMAGES_TABLE, [])?;
            Ok(())
        })
        .await?;
        tracing::debug!("images table ready");
        Ok(())
    }

    async fn put(&self, image: StoredImage) -> Result<i64, StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO images (filename, data) VALUES (?1, ?2)",
                params![image.name, image.bytes],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }
}
