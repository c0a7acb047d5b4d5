use async_trait::async_trait;

use crate::domain::entities::task::Task;
use crate::domain::repositories::Result;

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a task and return its assigned id
    async fn add(&self, task: Task) -> Result<i64>;

    /// Fetch a task by id, soft-deleted rows included
    async fn get(&self, task_id: i64) -> Result<Option<Task>>;

    /// Fetch several tasks at once; ids with no row are skipped
    async fn get_many(&self, task_ids: &[i64]) -> Result<Vec<Task>>;

    /// Persist every field of an existing task
    async fn update(&self, task: &Task) -> Result<()>;

    /// All non-deleted tasks belonging to a user
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Task>>;
}
