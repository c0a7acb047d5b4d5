use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::recurrence::{
    RecurrenceBehavior, RecurrenceRule, RecurrenceType, RecurrenceUnit,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Calendar day the task is due, timezone-resolved at the boundary.
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub deleted: bool,
    pub recurrence_type: RecurrenceType,
    pub recurrence_behavior: RecurrenceBehavior,
    /// Present iff `recurrence_type` is custom; the write boundary enforces
    /// this, reads degrade a broken stored rule to `None`.
    pub recurrence_rule: Option<RecurrenceRule>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(user_id: i64, title: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // assigned by the repository
            user_id,
            title,
            description,
            due_date: None,
            completed: false,
            deleted: false,
            recurrence_type: RecurrenceType::None,
            recurrence_behavior: RecurrenceBehavior::AfterCompletion,
            recurrence_rule: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.effective_rule().is_some()
    }

    /// The canonical rule for this task: built-in cadences expand to their
    /// shorthand, custom uses the validated stored rule.
    pub fn effective_rule(&self) -> Option<RecurrenceRule> {
        match self.recurrence_type {
            RecurrenceType::None => None,
            RecurrenceType::Daily => Some(RecurrenceRule::new(1, RecurrenceUnit::Day)),
            RecurrenceType::Weekly => Some(RecurrenceRule::new(1, RecurrenceUnit::Week)),
            RecurrenceType::Monthly => Some(RecurrenceRule::new(1, RecurrenceUnit::Month)),
            RecurrenceType::Custom => self.recurrence_rule.filter(RecurrenceRule::is_valid),
        }
    }

    /// Next occurrence computed from the due date, or from `fallback` when
    /// the task has no due date yet. `None` for non-recurring tasks.
    pub fn next_occurrence(&self, fallback: NaiveDate) -> Option<NaiveDate> {
        let anchor = self.due_date.unwrap_or(fallback);
        self.effective_rule()?.advance(anchor)
    }

    pub fn describe_recurrence(&self) -> String {
        match self.effective_rule() {
            None => "No recurrence".to_string(),
            Some(rule) if rule.interval == 1 => format!("Every {}", rule.unit.as_str()),
            Some(rule) => format!("Every {} {}s", rule.interval, rule.unit.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(value: &str) -> NaiveDate {
        crate::domain::value_objects::calendar_day::parse_day(value).unwrap()
    }

    #[test]
    fn builtin_types_expand_to_shorthand_rules() {
        let mut task = Task::new(1, "water plants".to_string(), None);
        task.recurrence_type = RecurrenceType::Weekly;
        assert_eq!(
            task.effective_rule(),
            Some(RecurrenceRule::new(1, RecurrenceUnit::Week))
        );
        assert_eq!(task.describe_recurrence(), "Every week");
    }

    #[test]
    fn next_occurrence_falls_back_when_no_due_date() {
        let mut task = Task::new(1, "journal".to_string(), None);
        task.recurrence_type = RecurrenceType::Daily;
        assert_eq!(task.next_occurrence(day("2026-02-21")), Some(day("2026-02-22")));

        task.due_date = Some(day("2026-03-01"));
        assert_eq!(task.next_occurrence(day("2026-02-21")), Some(day("2026-03-02")));
    }

    #[test]
    fn custom_without_valid_rule_is_not_recurring() {
        let mut task = Task::new(1, "review budget".to_string(), None);
        task.recurrence_type = RecurrenceType::Custom;
        assert!(!task.is_recurring());

        task.recurrence_rule = Some(RecurrenceRule::new(0, RecurrenceUnit::Day));
        assert!(!task.is_recurring());
    }
}
