pub mod dispatch;
pub mod task;
pub mod template_preset;
pub mod user_preferences;

pub use dispatch::{Dispatch, DispatchTask};
pub use task::Task;
pub use template_preset::{PresetKind, TemplatePreset, TEMPLATE_PRESET_LIMIT};
pub use user_preferences::UserPreferences;
