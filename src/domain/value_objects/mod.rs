pub mod calendar_day;
pub mod recurrence;
pub mod weekday_format;

pub use recurrence::{
    RecurrenceBehavior, RecurrenceRule, RecurrenceType, RecurrenceUnit, StoredRule,
};
