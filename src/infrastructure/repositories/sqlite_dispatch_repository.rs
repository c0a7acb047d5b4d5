use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{Row, params};

use crate::domain::entities::dispatch::Dispatch;
use crate::domain::repositories::{DispatchRepository, RepositoryError, Result};
use crate::domain::value_objects::calendar_day::{format_day, parse_day};
use crate::infrastructure::database::DatabaseManager;
use crate::infrastructure::repositories::{conversion_err, storage_err};

pub struct SqliteDispatchRepository {
    db: DatabaseManager,
}

impl SqliteDispatchRepository {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    fn row_to_dispatch(row: &Row) -> rusqlite::Result<Dispatch> {
        let date_text: String = row.get("date")?;
        // The date is part of the unique key; a corrupt value is a real
        // storage fault, not something to paper over.
        let date = parse_day(&date_text)
            .ok_or_else(|| conversion_err(format!("invalid dispatch date: {date_text}")))?;

        Ok(Dispatch {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            date,
            summary: row.get("summary")?,
            finalized: row.get("finalized")?,
        })
    }

    /// `Some(true)` open, `Some(false)` finalized, `None` missing. Runs in
    /// the same blocking closure as the guarded write, under the shared
    /// connection lock, so the answer cannot go stale against it.
    fn open_state(
        conn: &rusqlite::Connection,
        dispatch_id: i64,
    ) -> rusqlite::Result<Option<bool>> {
        match conn.query_row(
            "SELECT finalized FROM dispatches WHERE id = ?1",
            params![dispatch_id],
            |row| row.get::<_, bool>(0),
        ) {
            Ok(finalized) => Ok(Some(!finalized)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl DispatchRepository for SqliteDispatchRepository {
    async fn get_or_create(&self, user_id: i64, date: NaiveDate) -> Result<Dispatch> {
        let day = format_day(date);
        self.db
            .execute_blocking(move |conn| {
                // INSERT OR IGNORE + re-select rides on the UNIQUE(user_id,
                // date) constraint, so two near-simultaneous calls converge
                // on the same row.
                conn.execute(
                    "INSERT OR IGNORE INTO dispatches (user_id, date, summary, finalized)
                     VALUES (?1, ?2, '', 0)",
                    params![user_id, day],
                )?;
                let mut stmt =
                    conn.prepare("SELECT * FROM dispatches WHERE user_id = ?1 AND date = ?2")?;
                stmt.query_row(params![user_id, day], Self::row_to_dispatch)
            })
            .await
            .map_err(storage_err)
    }

    async fn get(&self, dispatch_id: i64) -> Result<Option<Dispatch>> {
        self.db
            .execute_blocking(move |conn| {
                let mut stmt = conn.prepare("SELECT * FROM dispatches WHERE id = ?1")?;
                stmt.query_row(params![dispatch_id], Self::row_to_dispatch)
                    .map(Some)
                    .or_else(|e| match e {
                        rusqlite::Error::QueryReturnedNoRows => Ok(None),
                        other => Err(other),
                    })
            })
            .await
            .map_err(storage_err)
    }

    async fn find_by_user_date(&self, user_id: i64, date: NaiveDate) -> Result<Option<Dispatch>> {
        let day = format_day(date);
        self.db
            .execute_blocking(move |conn| {
                let mut stmt =
                    conn.prepare("SELECT * FROM dispatches WHERE user_id = ?1 AND date = ?2")?;
                stmt.query_row(params![user_id, day], Self::row_to_dispatch)
                    .map(Some)
                    .or_else(|e| match e {
                        rusqlite::Error::QueryReturnedNoRows => Ok(None),
                        other => Err(other),
                    })
            })
            .await
            .map_err(storage_err)
    }

    async fn update_summary(&self, dispatch_id: i64, summary: &str) -> Result<bool> {
        let summary = summary.to_string();
        let outcome = self
            .db
            .execute_blocking(move |conn| {
                let updated = conn.execute(
                    "UPDATE dispatches SET summary = ?2 WHERE id = ?1 AND finalized = 0",
                    params![dispatch_id, summary],
                )?;
                if updated > 0 {
                    return Ok(Some(true));
                }
                Self::open_state(conn, dispatch_id)
            })
            .await
            .map_err(storage_err)?;

        outcome.ok_or(RepositoryError::NotFound)
    }

    async fn finalize(&self, dispatch_id: i64) -> Result<bool> {
        // The WHERE clause is the concurrency guard: only one caller can
        // observe the 0 -> 1 transition.
        self.db
            .execute_blocking(move |conn| {
                conn.execute(
                    "UPDATE dispatches SET finalized = 1 WHERE id = ?1 AND finalized = 0",
                    params![dispatch_id],
                )
            })
            .await
            .map(|rows| rows > 0)
            .map_err(storage_err)
    }

    async fn link_task(&self, dispatch_id: i64, task_id: i64) -> Result<bool> {
        let outcome = self
            .db
            .execute_blocking(move |conn| {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO dispatch_tasks (dispatch_id, task_id)
                     SELECT ?1, ?2 FROM dispatches WHERE id = ?1 AND finalized = 0",
                    params![dispatch_id, task_id],
                )?;
                if inserted > 0 {
                    return Ok(Some(true));
                }
                // No insert: the dispatch is finalized or missing, or the
                // pair already exists on an open dispatch (idempotent).
                Self::open_state(conn, dispatch_id)
            })
            .await
            .map_err(storage_err)?;

        outcome.ok_or(RepositoryError::NotFound)
    }

    async fn unlink_task(&self, dispatch_id: i64, task_id: i64) -> Result<bool> {
        let outcome = self
            .db
            .execute_blocking(move |conn| {
                conn.execute(
                    "DELETE FROM dispatch_tasks WHERE dispatch_id = ?1 AND task_id = ?2
                     AND EXISTS (SELECT 1 FROM dispatches WHERE id = ?1 AND finalized = 0)",
                    params![dispatch_id, task_id],
                )?;
                Self::open_state(conn, dispatch_id)
            })
            .await
            .map_err(storage_err)?;

        outcome.ok_or(RepositoryError::NotFound)
    }

    async fn linked_task_ids(&self, dispatch_id: i64) -> Result<Vec<i64>> {
        self.db
            .execute_blocking(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT task_id FROM dispatch_tasks WHERE dispatch_id = ?1 ORDER BY task_id",
                )?;
                let rows = stmt.query_map(params![dispatch_id], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .map_err(storage_err)
    }
}
