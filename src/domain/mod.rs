pub mod entities;
pub mod repositories;
pub mod value_objects;

pub use entities::{Dispatch, DispatchTask, PresetKind, Task, TemplatePreset, UserPreferences};
pub use value_objects::{
    RecurrenceBehavior, RecurrenceRule, RecurrenceType, RecurrenceUnit, StoredRule,
};
