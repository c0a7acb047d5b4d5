use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use tracing::info;

/// Primary manager for SQLite database operations; provides async-friendly access to synchronous rusqlite connections using tokio's spawn_blocking.
#[derive(Clone)]
pub struct DatabaseManager {
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseManager {
    /// Create a new instance of the DatabaseManager; opens the SQLite database and configures it for better concurrency.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let connection = Connection::open(db_path)?;

        connection.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// In-memory database for tests and throwaway sessions. Foreign keys on,
    /// no WAL (meaningless without a file).
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        connection.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Execute a blocking database operation in a tokio-aware manner; moves the operation to a blocking thread pool to avoid blocking the async runtime.
    pub async fn execute_blocking<F, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = self.connection.clone();
        tokio::task::spawn_blocking(move || {
            let conn = connection
                .lock()
                .map_err(|_| rusqlite::Error::InvalidQuery)?;
            operation(&conn)
        })
        .await
        .context("Failed to execute blocking database operation - task join error")?
        .context("Database operation failed")
    }

    /// Initialize the database by creating all the tables from schema.sql.
    pub async fn initialize_database(&self) -> Result<()> {
        let schema = include_str!("schema.sql");

        self.execute_blocking(move |connection| connection.execute_batch(schema))
            .await?;

        info!("database schema initialized");
        Ok(())
    }
}
