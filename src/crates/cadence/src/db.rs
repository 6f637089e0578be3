//! Database management and migrations
//!
//! SQLite connection pool and embedded schema migrations for the tracker
//! store.

use crate::error::{CadenceError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Type alias for the database connection pool.
pub type DatabasePool = SqlitePool;

/// Database connection wrapper.
#[derive(Clone, Debug)]
pub struct Database {
    pub(crate) pool: Arc<DatabasePool>,
}

impl Database {
    /// Open (creating if needed) the database at `path` and run migrations.
    pub async fn initialize<P: AsRef<Path>>(path: P, max_connections: u32) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CadenceError::Database(format!("failed to create database directory: {}", e))
                })?;
            }
        }

        debug!(path = %path.display(), "connecting to database");

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| CadenceError::Database(format!("failed to connect: {}", e)))?;

        let db = Self {
            pool: Arc::new(pool),
        };
        db.run_migrations().await?;

        info!(path = %path.display(), "database ready");
        Ok(db)
    }

    /// In-memory database for tests.
    ///
    /// A single pooled connection: every `sqlite::memory:` connection is
    /// its own database, so the pool must never open a second one.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| CadenceError::Database(format!("failed to connect: {}", e)))?;

        let db = Self {
            pool: Arc::new(pool),
        };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Run embedded migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(|e| CadenceError::Database(format!("migration failed: {}", e)))?;
        Ok(())
    }

    /// Perform a health check by running a simple query.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| CadenceError::Database(format!("health check failed: {}", e)))?;
        Ok(())
    }

    /// Close the database connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_database_migrates_and_responds() {
        let db = Database::in_memory().await.unwrap();
        db.health_check().await.unwrap();

        // Migrations created the three tables.
        for table in ["tasks", "task_history", "sync_runs"] {
            let row: (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(table)
            .fetch_one(db.pool())
            .await
            .unwrap();
            assert_eq!(row.0, 1, "missing table {}", table);
        }

        db.close().await;
    }
}
