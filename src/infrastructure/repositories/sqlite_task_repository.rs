use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Row, params};

use crate::domain::entities::task::Task;
use crate::domain::repositories::{RepositoryError, Result, TaskRepository};
use crate::domain::value_objects::calendar_day::{format_day, parse_day};
use crate::domain::value_objects::recurrence::{
    RecurrenceBehavior, RecurrenceRule, RecurrenceType, StoredRule, parse_custom_rule,
};
use crate::infrastructure::database::DatabaseManager;
use crate::infrastructure::repositories::storage_err;

pub struct SqliteTaskRepository {
    db: DatabaseManager,
}

impl SqliteTaskRepository {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    // Reads are fail-soft: an unknown enum string, a broken date, or a
    // corrupt stored rule degrades to the field's neutral value instead of
    // failing the whole row.
    fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
        let recurrence_type = row
            .get::<_, String>("recurrence_type")
            .map(|s| RecurrenceType::parse(&s).unwrap_or_default())?;

        let recurrence_rule = match recurrence_type {
            RecurrenceType::Custom => row
                .get::<_, Option<String>>("recurrence_rule")?
                .and_then(|json| parse_custom_rule(Some(&StoredRule::Encoded(json)))),
            _ => None,
        };

        Ok(Task {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            due_date: row
                .get::<_, Option<String>>("due_date")?
                .and_then(|s| parse_day(&s)),
            completed: row.get("completed")?,
            deleted: row.get("deleted")?,
            recurrence_type,
            recurrence_behavior: row
                .get::<_, String>("recurrence_behavior")
                .map(|s| RecurrenceBehavior::parse(&s).unwrap_or_default())?
                .normalized(recurrence_type),
            recurrence_rule,
            created_at: Self::parse_timestamp(row.get::<_, String>("created_at")?),
            updated_at: Self::parse_timestamp(row.get::<_, String>("updated_at")?),
        })
    }

    fn parse_timestamp(value: String) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn rule_to_json(rule: Option<&RecurrenceRule>) -> Option<String> {
        rule.and_then(|r| serde_json::to_string(r).ok())
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn add(&self, task: Task) -> Result<i64> {
        self.db
            .execute_blocking(move |conn| {
                conn.execute(
                    "INSERT INTO tasks (
                        user_id, title, description, due_date, completed, deleted,
                        recurrence_type, recurrence_behavior, recurrence_rule,
                        created_at, updated_at
                     )
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    params![
                        task.user_id,
                        task.title,
                        task.description,
                        task.due_date.map(format_day),
                        task.completed,
                        task.deleted,
                        task.recurrence_type.as_str(),
                        task.recurrence_behavior.as_str(),
                        Self::rule_to_json(task.recurrence_rule.as_ref()),
                        task.created_at.to_rfc3339(),
                        task.updated_at.to_rfc3339(),
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(storage_err)
    }

    async fn get(&self, task_id: i64) -> Result<Option<Task>> {
        self.db
            .execute_blocking(move |conn| {
                let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;
                stmt.query_row(params![task_id], Self::row_to_task)
                    .map(Some)
                    .or_else(|e| match e {
                        rusqlite::Error::QueryReturnedNoRows => Ok(None),
                        other => Err(other),
                    })
            })
            .await
            .map_err(storage_err)
    }

    async fn get_many(&self, task_ids: &[i64]) -> Result<Vec<Task>> {
        let ids = task_ids.to_vec();
        self.db
            .execute_blocking(move |conn| {
                let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;
                let mut tasks = Vec::with_capacity(ids.len());
                for id in ids {
                    match stmt.query_row(params![id], Self::row_to_task) {
                        Ok(task) => tasks.push(task),
                        Err(rusqlite::Error::QueryReturnedNoRows) => {}
                        Err(other) => return Err(other),
                    }
                }
                Ok(tasks)
            })
            .await
            .map_err(storage_err)
    }

    async fn update(&self, task: &Task) -> Result<()> {
        let task = task.clone();
        let updated = self
            .db
            .execute_blocking(move |conn| {
                conn.execute(
                    "UPDATE tasks SET
                        user_id = ?2, title = ?3, description = ?4, due_date = ?5,
                        completed = ?6, deleted = ?7, recurrence_type = ?8,
                        recurrence_behavior = ?9, recurrence_rule = ?10, updated_at = ?11
                     WHERE id = ?1",
                    params![
                        task.id,
                        task.user_id,
                        task.title,
                        task.description,
                        task.due_date.map(format_day),
                        task.completed,
                        task.deleted,
                        task.recurrence_type.as_str(),
                        task.recurrence_behavior.as_str(),
                        Self::rule_to_json(task.recurrence_rule.as_ref()),
                        Utc::now().to_rfc3339(),
                    ],
                )
            })
            .await
            .map_err(storage_err)?;

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Task>> {
        self.db
            .execute_blocking(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT * FROM tasks WHERE user_id = ?1 AND deleted = 0 ORDER BY id",
                )?;
                let rows = stmt.query_map(params![user_id], Self::row_to_task)?;
                rows.collect()
            })
            .await
            .map_err(storage_err)
    }
}
