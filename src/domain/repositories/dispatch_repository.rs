use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::entities::dispatch::Dispatch;
use crate::domain::repositories::Result;

/// Storage contract for dispatches and their task links. Uniqueness of
/// `(user_id, date)` and `(dispatch_id, task_id)` lives here, behind SQL
/// constraints, so concurrent callers converge on one row.
#[async_trait]
pub trait DispatchRepository: Send + Sync {
    /// Look up by the unique `(user_id, date)` key, inserting a fresh open
    /// dispatch when absent. Idempotent.
    async fn get_or_create(&self, user_id: i64, date: NaiveDate) -> Result<Dispatch>;

    async fn get(&self, dispatch_id: i64) -> Result<Option<Dispatch>>;

    async fn find_by_user_date(&self, user_id: i64, date: NaiveDate) -> Result<Option<Dispatch>>;

    /// Rewrites the summary of an open dispatch. Returns `false` when the
    /// dispatch is finalized; the row is left untouched then. The finalized
    /// check and the write are a single atomic step, so no completion can
    /// slip in between them.
    async fn update_summary(&self, dispatch_id: i64, summary: &str) -> Result<bool>;

    /// Atomically flips the finalized flag. Returns `false` when the
    /// dispatch was already finalized (the row is left untouched).
    async fn finalize(&self, dispatch_id: i64) -> Result<bool>;

    /// Links a task to an open dispatch; linking an already-linked pair is
    /// a no-op. Returns `false` when the dispatch is finalized and nothing
    /// was written. Guarded atomically like [`Self::update_summary`].
    async fn link_task(&self, dispatch_id: i64, task_id: i64) -> Result<bool>;

    /// Unlinks a pair from an open dispatch; a non-linked pair is a no-op.
    /// Returns `false` when the dispatch is finalized.
    async fn unlink_task(&self, dispatch_id: i64, task_id: i64) -> Result<bool>;

    async fn linked_task_ids(&self, dispatch_id: i64) -> Result<Vec<i64>>;
}
