use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::domain::entities::dispatch::{Dispatch, DispatchTask};
use crate::domain::entities::task::Task;
use crate::domain::repositories::{DispatchRepository, RepositoryError, TaskRepository};

#[derive(Debug)]
pub enum DispatchError {
    NotFound,
    AlreadyFinalized,
    TaskNotFound,
    TaskNotOwned,
    Repository(RepositoryError),
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DispatchError::NotFound => write!(f, "Dispatch not found"),
            DispatchError::AlreadyFinalized => write!(f, "Dispatch is already finalized"),
            DispatchError::TaskNotFound => write!(f, "Task not found"),
            DispatchError::TaskNotOwned => write!(f, "Task belongs to another user"),
            DispatchError::Repository(e) => write!(f, "Repository error: {}", e),
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<RepositoryError> for DispatchError {
    fn from(error: RepositoryError) -> Self {
        DispatchError::Repository(error)
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;

/// What `complete` hands back: the finalized dispatch, how many unfinished
/// tasks rolled forward, and where they went. `next_dispatch_id` is `None`
/// when nothing rolled over; no empty next-day dispatch is created then.
#[derive(Debug)]
pub struct DispatchCompletion {
    pub dispatch: Dispatch,
    pub rolled_over: usize,
    pub next_dispatch_id: Option<i64>,
}

/// The stateful workflow around a day's dispatch: lazy creation, task
/// links, and the finalize-plus-rollover transition. Dispatch state
/// violations are precondition failures and are rejected outright; nothing
/// here silently rewrites a day's plan.
pub struct DispatchOrchestrator {
    dispatch_repo: Arc<dyn DispatchRepository>,
    task_repo: Arc<dyn TaskRepository>,
}

impl DispatchOrchestrator {
    pub fn new(dispatch_repo: Arc<dyn DispatchRepository>, task_repo: Arc<dyn TaskRepository>) -> Self {
        Self {
            dispatch_repo,
            task_repo,
        }
    }

    /// The dispatch for `(user_id, date)`, created open and empty on first
    /// reference. Calling twice returns the same row.
    pub async fn get_or_create(&self, user_id: i64, date: NaiveDate) -> Result<Dispatch> {
        Ok(self.dispatch_repo.get_or_create(user_id, date).await?)
    }

    pub async fn update_summary(&self, dispatch_id: i64, summary: &str) -> Result<Dispatch> {
        let mut dispatch = self.get_open(dispatch_id).await?;
        // The repository re-checks the flag atomically with the write, so a
        // completion landing after the snapshot above still cannot be edited.
        if !self.dispatch_repo.update_summary(dispatch_id, summary).await? {
            return Err(DispatchError::AlreadyFinalized);
        }
        dispatch.summary = summary.to_string();
        Ok(dispatch)
    }

    /// Adds a task to the day's plan. Idempotent: linking an already-linked
    /// pair is a no-op. The task must exist, belong to the dispatch owner,
    /// and not be soft-deleted.
    pub async fn link_task(&self, dispatch_id: i64, task_id: i64) -> Result<DispatchTask> {
        let dispatch = self.get_open(dispatch_id).await?;

        let task = self
            .task_repo
            .get(task_id)
            .await?
            .filter(|t| !t.deleted)
            .ok_or(DispatchError::TaskNotFound)?;
        if task.user_id != dispatch.user_id {
            return Err(DispatchError::TaskNotOwned);
        }

        if !self.dispatch_repo.link_task(dispatch_id, task_id).await? {
            return Err(DispatchError::AlreadyFinalized);
        }
        Ok(DispatchTask {
            dispatch_id,
            task_id,
        })
    }

    /// Removes a task from the plan; unlinking a non-linked pair is a no-op.
    pub async fn unlink_task(&self, dispatch_id: i64, task_id: i64) -> Result<()> {
        self.get_open(dispatch_id).await?;
        if !self.dispatch_repo.unlink_task(dispatch_id, task_id).await? {
            return Err(DispatchError::AlreadyFinalized);
        }
        Ok(())
    }

    /// Tasks currently linked to the dispatch, minus soft-deleted ones.
    pub async fn linked_tasks(&self, dispatch_id: i64) -> Result<Vec<Task>> {
        let ids = self.dispatch_repo.linked_task_ids(dispatch_id).await?;
        let tasks = self.task_repo.get_many(&ids).await?;
        Ok(tasks.into_iter().filter(|t| !t.deleted).collect())
    }

    /// Finalizes the dispatch and rolls unfinished work forward. Unfinished
    /// linked tasks move to the dispatch of `date + 1 day` — exactly one day
    /// after this dispatch, however far in the past that is. A second
    /// completion of the same dispatch fails with no side effects.
    pub async fn complete(&self, dispatch_id: i64) -> Result<DispatchCompletion> {
        let mut dispatch = self
            .dispatch_repo
            .get(dispatch_id)
            .await?
            .ok_or(DispatchError::NotFound)?;

        // The repository-level flag flip is the atomic guard; only one
        // concurrent completion observes the transition.
        if !self.dispatch_repo.finalize(dispatch_id).await? {
            return Err(DispatchError::AlreadyFinalized);
        }
        dispatch.finalized = true;

        let unfinished: Vec<Task> = self
            .linked_tasks(dispatch_id)
            .await?
            .into_iter()
            .filter(|t| !t.completed)
            .collect();

        if unfinished.is_empty() {
            info!(dispatch_id, "dispatch finalized, nothing to roll over");
            return Ok(DispatchCompletion {
                dispatch,
                rolled_over: 0,
                next_dispatch_id: None,
            });
        }

        let next_date = dispatch.rollover_date().ok_or_else(|| {
            DispatchError::Repository(RepositoryError::InvalidData(
                "dispatch date out of range".to_string(),
            ))
        })?;
        let next = self
            .dispatch_repo
            .get_or_create(dispatch.user_id, next_date)
            .await?;

        let mut rolled_over = 0;
        for task in &unfinished {
            // A pre-existing next-day dispatch can itself be finalized
            // already; rolling into it would rewrite a closed plan.
            if !self.dispatch_repo.link_task(next.id, task.id).await? {
                return Err(DispatchError::AlreadyFinalized);
            }
            rolled_over += 1;
        }

        info!(
            dispatch_id,
            next_dispatch_id = next.id,
            rolled_over,
            "dispatch finalized with rollover"
        );

        Ok(DispatchCompletion {
            dispatch,
            rolled_over,
            next_dispatch_id: Some(next.id),
        })
    }

    async fn get_open(&self, dispatch_id: i64) -> Result<Dispatch> {
        let dispatch = self
            .dispatch_repo
            .get(dispatch_id)
            .await?
            .ok_or(DispatchError::NotFound)?;
        if !dispatch.is_open() {
            return Err(DispatchError::AlreadyFinalized);
        }
        Ok(dispatch)
    }
}
