use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Row, params};

use crate::domain::entities::template_preset::{PresetKind, TemplatePreset};
use crate::domain::repositories::{Result, TemplatePresetRepository};
use crate::infrastructure::database::DatabaseManager;
use crate::infrastructure::repositories::{conversion_err, storage_err};

pub struct SqliteTemplatePresetRepository {
    db: DatabaseManager,
}

impl SqliteTemplatePresetRepository {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    fn row_to_preset(row: &Row) -> rusqlite::Result<TemplatePreset> {
        let kind_text: String = row.get("kind")?;
        let kind = PresetKind::parse(&kind_text)
            .ok_or_else(|| conversion_err(format!("invalid preset kind: {kind_text}")))?;

        Ok(TemplatePreset {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            kind,
            name: row.get("name")?,
            body: row.get("body")?,
            created_at: DateTime::parse_from_rfc3339(&row.get::<_, String>("created_at")?)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

#[async_trait]
impl TemplatePresetRepository for SqliteTemplatePresetRepository {
    async fn add(&self, preset: TemplatePreset) -> Result<i64> {
        self.db
            .execute_blocking(move |conn| {
                conn.execute(
                    "INSERT INTO template_presets (user_id, kind, name, body, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        preset.user_id,
                        preset.kind.as_str(),
                        preset.name,
                        preset.body,
                        preset.created_at.to_rfc3339(),
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(storage_err)
    }

    async fn get(&self, preset_id: i64) -> Result<Option<TemplatePreset>> {
        self.db
            .execute_blocking(move |conn| {
                let mut stmt = conn.prepare("SELECT * FROM template_presets WHERE id = ?1")?;
                stmt.query_row(params![preset_id], Self::row_to_preset)
                    .map(Some)
                    .or_else(|e| match e {
                        rusqlite::Error::QueryReturnedNoRows => Ok(None),
                        other => Err(other),
                    })
            })
            .await
            .map_err(storage_err)
    }

    async fn list_by_user_kind(
        &self,
        user_id: i64,
        kind: PresetKind,
    ) -> Result<Vec<TemplatePreset>> {
        self.db
            .execute_blocking(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT * FROM template_presets
                     WHERE user_id = ?1 AND kind = ?2 ORDER BY name",
                )?;
                let rows = stmt.query_map(params![user_id, kind.as_str()], Self::row_to_preset)?;
                rows.collect()
            })
            .await
            .map_err(storage_err)
    }

    async fn count_by_user_kind(&self, user_id: i64, kind: PresetKind) -> Result<usize> {
        self.db
            .execute_blocking(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM template_presets WHERE user_id = ?1 AND kind = ?2",
                    params![user_id, kind.as_str()],
                    |row| row.get(0),
                )?;
                Ok(count as usize)
            })
            .await
            .map_err(storage_err)
    }

    async fn delete(&self, preset_id: i64) -> Result<bool> {
        self.db
            .execute_blocking(move |conn| {
                conn.execute(
                    "DELETE FROM template_presets WHERE id = ?1",
                    params![preset_id],
                )
            })
            .await
            .map(|rows| rows > 0)
            .map_err(storage_err)
    }
}
