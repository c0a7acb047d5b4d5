use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// The per-user-per-day planning record. One row per `(user_id, date)`;
/// created lazily the first time a date is referenced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispatch {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub summary: String,
    /// One-way flag: an open dispatch can be finalized, never reopened.
    pub finalized: bool,
}

impl Dispatch {
    pub fn is_open(&self) -> bool {
        !self.finalized
    }

    /// The calendar day unfinished work rolls over to: exactly one day after
    /// this dispatch, however far behind "today" it is.
    pub fn rollover_date(&self) -> Option<NaiveDate> {
        self.date.checked_add_days(Days::new(1))
    }
}

/// Membership of a task in a day's plan. The pair is unique; it carries no
/// ownership semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchTask {
    pub dispatch_id: i64,
    pub task_id: i64,
}
