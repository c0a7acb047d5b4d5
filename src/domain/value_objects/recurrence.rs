use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::value_objects::calendar_day::{format_day, parse_day};

/// Largest interval a custom rule may carry.
pub const MAX_RULE_INTERVAL: u32 = 365;

/// Hard ceiling for the forward search in [`next_occurrence_on_or_after`].
/// Hitting it means "no answer within bound" and yields `None`, never a loop.
pub const MAX_FORWARD_STEPS: u32 = 4000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl RecurrenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceType::None => "none",
            RecurrenceType::Daily => "daily",
            RecurrenceType::Weekly => "weekly",
            RecurrenceType::Monthly => "monthly",
            RecurrenceType::Custom => "custom",
        }
    }

    /// Parses the stored string form into the enum
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(RecurrenceType::None),
            "daily" => Some(RecurrenceType::Daily),
            "weekly" => Some(RecurrenceType::Weekly),
            "monthly" => Some(RecurrenceType::Monthly),
            "custom" => Some(RecurrenceType::Custom),
            _ => None,
        }
    }

    pub fn is_valid(value: &str) -> bool {
        Self::parse(value).is_some()
    }
}

/// Governs when the next occurrence of a recurring task is materialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceBehavior {
    /// The task's due date moves forward when the task is completed.
    #[default]
    AfterCompletion,
    /// A new task instance is expected on each scheduled date; requires a
    /// due date as the anchor. The duplication trigger itself lives outside
    /// this engine.
    DuplicateOnSchedule,
}

impl RecurrenceBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceBehavior::AfterCompletion => "after_completion",
            RecurrenceBehavior::DuplicateOnSchedule => "duplicate_on_schedule",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "after_completion" => Some(RecurrenceBehavior::AfterCompletion),
            "duplicate_on_schedule" => Some(RecurrenceBehavior::DuplicateOnSchedule),
            _ => None,
        }
    }

    pub fn is_valid(value: &str) -> bool {
        Self::parse(value).is_some()
    }

    /// With no recurrence there is nothing to duplicate against, so the
    /// behavior always normalizes to `AfterCompletion`.
    pub fn normalized(self, recurrence_type: RecurrenceType) -> Self {
        if recurrence_type == RecurrenceType::None {
            RecurrenceBehavior::AfterCompletion
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceUnit {
    Day,
    Week,
    Month,
}

impl RecurrenceUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceUnit::Day => "day",
            RecurrenceUnit::Week => "week",
            RecurrenceUnit::Month => "month",
        }
    }
}

/// A validated custom cadence: "every `interval` `unit`s".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub interval: u32,
    pub unit: RecurrenceUnit,
}

impl RecurrenceRule {
    pub fn new(interval: u32, unit: RecurrenceUnit) -> Self {
        Self { interval, unit }
    }

    pub fn is_valid(&self) -> bool {
        (1..=MAX_RULE_INTERVAL).contains(&self.interval)
    }

    /// One step forward from `anchor`. Month addition clamps the day of
    /// month to the target month's last day (Jan 31 + 1 month = Feb 28/29,
    /// never a rollover into March).
    pub fn advance(&self, anchor: NaiveDate) -> Option<NaiveDate> {
        match self.unit {
            RecurrenceUnit::Day => anchor.checked_add_days(Days::new(u64::from(self.interval))),
            RecurrenceUnit::Week => {
                anchor.checked_add_days(Days::new(u64::from(self.interval) * 7))
            }
            RecurrenceUnit::Month => anchor.checked_add_months(Months::new(self.interval)),
        }
    }
}

/// The shape a custom rule takes in storage: either structured JSON or a
/// JSON-encoded string, written interchangeably by older clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredRule {
    Encoded(String),
    Structured(Value),
}

impl From<RecurrenceRule> for StoredRule {
    fn from(rule: RecurrenceRule) -> Self {
        StoredRule::Structured(serde_json::json!({
            "interval": rule.interval,
            "unit": rule.unit.as_str(),
        }))
    }
}

/// Normalizes either stored encoding into a validated rule. Any malformed
/// shape, including a non-parseable string, is treated as "no rule" rather
/// than an error; the write boundary is the only place that rejects bad
/// rules loudly.
pub fn parse_custom_rule(stored: Option<&StoredRule>) -> Option<RecurrenceRule> {
    let value = match stored? {
        StoredRule::Encoded(text) => serde_json::from_str::<Value>(text).ok()?,
        StoredRule::Structured(value) => value.clone(),
    };
    // Only the `{"interval": .., "unit": ..}` object form counts; serde
    // would also accept a JSON sequence for the struct.
    if !value.is_object() {
        return None;
    }
    let rule = serde_json::from_value::<RecurrenceRule>(value).ok()?;
    rule.is_valid().then_some(rule)
}

/// Resolves a recurrence type plus its stored payload into the canonical
/// rule. Built-in types ignore the payload entirely.
pub fn resolve_rule(
    recurrence_type: RecurrenceType,
    stored: Option<&StoredRule>,
) -> Option<RecurrenceRule> {
    match recurrence_type {
        RecurrenceType::None => None,
        RecurrenceType::Daily => Some(RecurrenceRule::new(1, RecurrenceUnit::Day)),
        RecurrenceType::Weekly => Some(RecurrenceRule::new(1, RecurrenceUnit::Week)),
        RecurrenceType::Monthly => Some(RecurrenceRule::new(1, RecurrenceUnit::Month)),
        RecurrenceType::Custom => parse_custom_rule(stored),
    }
}

/// Human-readable cadence, e.g. "Every day" or "Every 3 weeks".
pub fn describe(recurrence_type: RecurrenceType, stored: Option<&StoredRule>) -> String {
    match resolve_rule(recurrence_type, stored) {
        None => "No recurrence".to_string(),
        Some(rule) if rule.interval == 1 => format!("Every {}", rule.unit.as_str()),
        Some(rule) => format!("Every {} {}s", rule.interval, rule.unit.as_str()),
    }
}

/// Computes the single next occurrence after `anchor`, or `None` when no
/// recurrence is configured. Pure; never touches stored state.
pub fn next_occurrence(
    anchor: NaiveDate,
    recurrence_type: RecurrenceType,
    stored: Option<&StoredRule>,
) -> Option<NaiveDate> {
    resolve_rule(recurrence_type, stored)?.advance(anchor)
}

/// Searches forward from `anchor` for the first occurrence on or after
/// `target`. An anchor already past the target is returned unchanged. The
/// search is capped at [`MAX_FORWARD_STEPS`] advances; hitting the cap is a
/// defined `None`, not an error.
pub fn next_occurrence_on_or_after(
    anchor: NaiveDate,
    recurrence_type: RecurrenceType,
    stored: Option<&StoredRule>,
    target: NaiveDate,
) -> Option<NaiveDate> {
    let rule = resolve_rule(recurrence_type, stored)?;
    if anchor >= target {
        return Some(anchor);
    }

    let mut current = anchor;
    for _ in 0..MAX_FORWARD_STEPS {
        current = rule.advance(current)?;
        if current >= target {
            return Some(current);
        }
    }
    None
}

/// String-boundary variant of [`next_occurrence`] for callers holding raw
/// day strings; malformed anchors yield `None`.
pub fn next_occurrence_str(
    anchor: &str,
    recurrence_type: RecurrenceType,
    stored: Option<&StoredRule>,
) -> Option<String> {
    let anchor = parse_day(anchor)?;
    next_occurrence(anchor, recurrence_type, stored).map(format_day)
}
