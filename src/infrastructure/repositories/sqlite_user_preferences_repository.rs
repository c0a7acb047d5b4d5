use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::domain::entities::user_preferences::UserPreferences;
use crate::domain::repositories::{Result, UserPreferencesRepository};
use crate::infrastructure::database::DatabaseManager;
use crate::infrastructure::repositories::storage_err;

pub struct SqliteUserPreferencesRepository {
    db: DatabaseManager,
}

impl SqliteUserPreferencesRepository {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserPreferencesRepository for SqliteUserPreferencesRepository {
    async fn get(&self, user_id: i64) -> Result<Option<UserPreferences>> {
        self.db
            .execute_blocking(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT user_id, timezone, created_at, updated_at
                     FROM user_preferences WHERE user_id = ?1",
                )?;
                stmt.query_row(params![user_id], |row| {
                    let parse_ts = |value: String| {
                        DateTime::parse_from_rfc3339(&value)
                            .map(|dt| dt.with_timezone(&Utc))
                            .unwrap_or_else(|_| Utc::now())
                    };
                    Ok(UserPreferences {
                        user_id: row.get(0)?,
                        timezone: row.get(1)?,
                        created_at: parse_ts(row.get::<_, String>(2)?),
                        updated_at: parse_ts(row.get::<_, String>(3)?),
                    })
                })
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })
            })
            .await
            .map_err(storage_err)
    }

    async fn save(&self, preferences: &UserPreferences) -> Result<()> {
        let prefs = preferences.clone();
        self.db
            .execute_blocking(move |conn| {
                conn.execute(
                    "INSERT INTO user_preferences (user_id, timezone, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(user_id)
                     DO UPDATE SET timezone = excluded.timezone, updated_at = excluded.updated_at",
                    params![
                        prefs.user_id,
                        prefs.timezone,
                        prefs.created_at.to_rfc3339(),
                        prefs.updated_at.to_rfc3339(),
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    async fn delete(&self, user_id: i64) -> Result<()> {
        self.db
            .execute_blocking(move |conn| {
                conn.execute(
                    "DELETE FROM user_preferences WHERE user_id = ?1",
                    params![user_id],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }
}
