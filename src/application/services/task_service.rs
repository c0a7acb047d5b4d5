use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::application::services::timezone_service::TimezoneService;
use crate::domain::entities::task::Task;
use crate::domain::repositories::{RepositoryError, TaskRepository};
use crate::domain::value_objects::recurrence::{
    self, MAX_RULE_INTERVAL, RecurrenceBehavior, RecurrenceRule, RecurrenceType, StoredRule,
};

#[derive(Debug)]
pub enum TaskError {
    NotFound,
    Validation(String),
    Repository(RepositoryError),
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TaskError::NotFound => write!(f, "Task not found"),
            TaskError::Validation(msg) => write!(f, "{}", msg),
            TaskError::Repository(e) => write!(f, "Repository error: {}", e),
        }
    }
}

impl std::error::Error for TaskError {}

impl From<RepositoryError> for TaskError {
    fn from(error: RepositoryError) -> Self {
        TaskError::Repository(error)
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;

/// Recurrence fields as they arrive at the write boundary: enums already
/// membership-checked by the caller, the rule still in its loose stored
/// shape. Validation here is fail-loud, unlike the read paths.
#[derive(Debug, Clone, Default)]
pub struct RecurrenceInput {
    pub recurrence_type: RecurrenceType,
    /// Defaults to `after_completion` when omitted.
    pub recurrence_behavior: Option<RecurrenceBehavior>,
    pub recurrence_rule: Option<StoredRule>,
}

pub struct TaskService {
    task_repo: Arc<dyn TaskRepository>,
    timezone_service: Arc<TimezoneService>,
}

impl TaskService {
    pub fn new(task_repo: Arc<dyn TaskRepository>, timezone_service: Arc<TimezoneService>) -> Self {
        Self {
            task_repo,
            timezone_service,
        }
    }

    pub async fn create_task(
        &self,
        user_id: i64,
        title: String,
        description: Option<String>,
        due_date: Option<NaiveDate>,
        recurrence: RecurrenceInput,
    ) -> Result<i64> {
        if title.trim().is_empty() {
            return Err(TaskError::Validation("Task title cannot be empty".to_string()));
        }

        let (rtype, behavior, rule) = validate_recurrence(&recurrence, due_date)?;

        let mut task = Task::new(user_id, title, description);
        task.due_date = due_date;
        task.recurrence_type = rtype;
        task.recurrence_behavior = behavior;
        task.recurrence_rule = rule;

        Ok(self.task_repo.add(task).await?)
    }

    /// Replaces the recurrence configuration of an existing task, validated
    /// against its current due date.
    pub async fn update_recurrence(&self, task_id: i64, recurrence: RecurrenceInput) -> Result<Task> {
        let mut task = self.get_active(task_id).await?;
        let (rtype, behavior, rule) = validate_recurrence(&recurrence, task.due_date)?;

        task.recurrence_type = rtype;
        task.recurrence_behavior = behavior;
        task.recurrence_rule = rule;
        self.task_repo.update(&task).await?;
        Ok(task)
    }

    pub async fn set_due_date(&self, task_id: i64, due_date: Option<NaiveDate>) -> Result<Task> {
        let mut task = self.get_active(task_id).await?;
        if due_date.is_none()
            && task.recurrence_behavior == RecurrenceBehavior::DuplicateOnSchedule
        {
            return Err(TaskError::Validation(
                "due_date is required when recurrence_behavior is duplicate_on_schedule"
                    .to_string(),
            ));
        }
        task.due_date = due_date;
        self.task_repo.update(&task).await?;
        Ok(task)
    }

    /// Transitions a task to done. A task carrying an after-completion
    /// recurrence does not close: its due date advances to the next
    /// occurrence instead, anchored on the current due date or on "today"
    /// in the user's zone when no due date is set.
    pub async fn complete_task(&self, task_id: i64) -> Result<Task> {
        let mut task = self.get_active(task_id).await?;

        let advanced = match task.effective_rule() {
            Some(rule) if task.recurrence_behavior == RecurrenceBehavior::AfterCompletion => {
                let today = self.timezone_service.today_for_user(task.user_id).await;
                let anchor = task.due_date.unwrap_or(today);
                rule.advance(anchor)
            }
            _ => None,
        };

        match advanced {
            Some(next) => {
                info!(task_id, next = %next, "recurring task advanced on completion");
                task.due_date = Some(next);
                task.completed = false;
            }
            None => {
                task.completed = true;
            }
        }

        self.task_repo.update(&task).await?;
        Ok(task)
    }

    /// Soft delete; the row stays for dispatch history but drops out of
    /// every listing and rollover.
    pub async fn delete_task(&self, task_id: i64) -> Result<()> {
        let mut task = self.get_active(task_id).await?;
        task.deleted = true;
        self.task_repo.update(&task).await?;
        Ok(())
    }

    pub async fn list_tasks(&self, user_id: i64) -> Result<Vec<Task>> {
        Ok(self.task_repo.list_by_user(user_id).await?)
    }

    pub async fn describe_recurrence(&self, task_id: i64) -> Result<String> {
        Ok(self.get_active(task_id).await?.describe_recurrence())
    }

    /// Previews the first occurrence on or after `target` (today in the
    /// user's zone when omitted). Read path: returns `None` both for "no
    /// recurrence" and "no answer within the search bound".
    pub async fn preview_next_occurrence(
        &self,
        task_id: i64,
        target: Option<NaiveDate>,
    ) -> Result<Option<NaiveDate>> {
        let task = self.get_active(task_id).await?;
        let target = match target {
            Some(date) => date,
            None => self.timezone_service.today_for_user(task.user_id).await,
        };
        let anchor = task.due_date.unwrap_or(target);
        let stored = task.recurrence_rule.map(StoredRule::from);
        Ok(recurrence::next_occurrence_on_or_after(
            anchor,
            task.recurrence_type,
            stored.as_ref(),
            target,
        ))
    }

    async fn get_active(&self, task_id: i64) -> Result<Task> {
        match self.task_repo.get(task_id).await? {
            Some(task) if !task.deleted => Ok(task),
            _ => Err(TaskError::NotFound),
        }
    }
}

/// The fail-loud counterpart of the fail-soft rule parsing: every violation
/// surfaces as a rejected write with a descriptive message.
fn validate_recurrence(
    input: &RecurrenceInput,
    due_date: Option<NaiveDate>,
) -> Result<(RecurrenceType, RecurrenceBehavior, Option<RecurrenceRule>)> {
    let rtype = input.recurrence_type;

    let rule = match rtype {
        RecurrenceType::Custom => {
            if input.recurrence_rule.is_none() {
                return Err(TaskError::Validation(
                    "recurrence_rule is required when recurrence_type is custom".to_string(),
                ));
            }
            match recurrence::parse_custom_rule(input.recurrence_rule.as_ref()) {
                Some(rule) => Some(rule),
                None => {
                    return Err(TaskError::Validation(format!(
                        "recurrence_rule must have an interval between 1 and {MAX_RULE_INTERVAL} \
                         and a unit of day, week, or month"
                    )));
                }
            }
        }
        _ => {
            if input.recurrence_rule.is_some() {
                return Err(TaskError::Validation(
                    "recurrence_rule can only be set when recurrence_type is custom".to_string(),
                ));
            }
            None
        }
    };

    let behavior = input.recurrence_behavior.unwrap_or_default().normalized(rtype);

    if behavior == RecurrenceBehavior::DuplicateOnSchedule && due_date.is_none() {
        return Err(TaskError::Validation(
            "due_date is required when recurrence_behavior is duplicate_on_schedule".to_string(),
        ));
    }

    Ok((rtype, behavior, rule))
}
