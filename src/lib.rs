//! Recurrence, rollover, and template-rendering engine for a personal
//! productivity application. Pure calendar math and template expansion live
//! in the domain and application layers; SQLite-backed repositories carry
//! the dispatch/task state the orchestrator works over.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod utils;

pub use application::services::{
    DispatchCompletion, DispatchError, DispatchOrchestrator, RecurrenceInput, TaskError,
    TaskService, TemplateError, TemplateService, TimezoneService, render_template,
};
pub use domain::{
    Dispatch, DispatchTask, PresetKind, RecurrenceBehavior, RecurrenceRule, RecurrenceType,
    RecurrenceUnit, StoredRule, Task, TemplatePreset, UserPreferences,
};
pub use infrastructure::database::DatabaseManager;
