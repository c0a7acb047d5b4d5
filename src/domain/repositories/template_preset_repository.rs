use async_trait::async_trait;

use crate::domain::entities::template_preset::{PresetKind, TemplatePreset};
use crate::domain::repositories::Result;

#[async_trait]
pub trait TemplatePresetRepository: Send + Sync {
    async fn add(&self, preset: TemplatePreset) -> Result<i64>;

    async fn get(&self, preset_id: i64) -> Result<Option<TemplatePreset>>;

    async fn list_by_user_kind(&self, user_id: i64, kind: PresetKind)
    -> Result<Vec<TemplatePreset>>;

    /// How many presets of `kind` the user already stores; the service
    /// enforces the per-kind ceiling against this count.
    async fn count_by_user_kind(&self, user_id: i64, kind: PresetKind) -> Result<usize>;

    async fn delete(&self, preset_id: i64) -> Result<bool>;
}
