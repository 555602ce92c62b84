use crate::database::models::{NewPerformance, PerformanceRecord};
use crate::database::query;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};

/// Handle on the performance record store. Cheap to clone (the pool is shared).
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens or creates the database file.
    pub async fn new(db_path: &Path) -> Result<Self, sqlx::Error> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    sqlx::Error::Io(std::io::Error::other(format!(
                        "Unable to create parent directory: {}",
                        e
                    )))
                })?;
            }
        }

        let absolute_path = if db_path.is_absolute() {
            db_path.to_path_buf()
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(db_path)
        };

        let options = SqliteConnectOptions::new()
            .filename(&absolute_path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;
        let db = Database { pool };
        db.init_schema().await?;
        Ok(db)
    }

    /// Private in-memory database. A single long-lived connection keeps the data alive.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let db = Database { pool };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS performance (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_hash TEXT NOT NULL UNIQUE,
                resource_id INTEGER,
                performance_value REAL NOT NULL,
                accuracy_percent REAL NOT NULL,
                modifier_flags INTEGER NOT NULL DEFAULT 0,
                last_computed_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_performance_resource_id ON performance(resource_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_hash(
        &self,
        content_hash: &str,
    ) -> Result<Option<PerformanceRecord>, sqlx::Error> {
        query::find_by_hash(&self.pool, content_hash).await
    }

    /// Returns up to two records carrying `resource_id`.
    pub async fn find_by_resource_id(
        &self,
        resource_id: u32,
    ) -> Result<Vec<PerformanceRecord>, sqlx::Error> {
        query::find_by_resource_id(&self.pool, resource_id).await
    }

    /// Inserts a record and reads it back.
    pub async fn insert(&self, new: &NewPerformance) -> Result<PerformanceRecord, sqlx::Error> {
        let id = query::insert_record(&self.pool, new).await?;
        self.reload(id).await
    }

    /// Overwrites the computed values of row `id` and reads it back.
    pub async fn update(
        &self,
        id: i64,
        new: &NewPerformance,
    ) -> Result<PerformanceRecord, sqlx::Error> {
        query::update_record(&self.pool, id, new).await?;
        self.reload(id).await
    }

    pub async fn backfill_resource_id(
        &self,
        id: i64,
        resource_id: u32,
    ) -> Result<PerformanceRecord, sqlx::Error> {
        query::backfill_resource_id(&self.pool, id, resource_id).await?;
        self.reload(id).await
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        query::count_records(&self.pool).await
    }

    async fn reload(&self, id: i64) -> Result<PerformanceRecord, sqlx::Error> {
        query::find_by_id(&self.pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }
}
