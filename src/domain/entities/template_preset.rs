use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-kind ceiling on stored presets for a single user.
pub const TEMPLATE_PRESET_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetKind {
    Task,
    Note,
    Dispatch,
}

impl PresetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetKind::Task => "task",
            PresetKind::Note => "note",
            PresetKind::Dispatch => "dispatch",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "task" => Some(PresetKind::Task),
            "note" => Some(PresetKind::Note),
            "dispatch" => Some(PresetKind::Dispatch),
            _ => None,
        }
    }
}

/// A user-scoped named template. Task presets store a JSON-encoded
/// `{title, description}` pair in `body`; note and dispatch presets store
/// free text. Either way the body runs through the template renderer on
/// instantiation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatePreset {
    pub id: i64,
    pub user_id: i64,
    pub kind: PresetKind,
    pub name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl TemplatePreset {
    pub fn new(user_id: i64, kind: PresetKind, name: String, body: String) -> Self {
        Self {
            id: 0,
            user_id,
            kind,
            name,
            body,
            created_at: Utc::now(),
        }
    }
}
