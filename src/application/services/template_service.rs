use std::sync::Arc;

use chrono::NaiveDate;

use crate::application::services::template_renderer::render_template;
use crate::application::services::timezone_service::TimezoneService;
use crate::domain::entities::template_preset::{PresetKind, TEMPLATE_PRESET_LIMIT, TemplatePreset};
use crate::domain::repositories::{RepositoryError, TemplatePresetRepository};

#[derive(Debug)]
pub enum TemplateError {
    NotFound,
    PresetLimitReached,
    Validation(String),
    Repository(RepositoryError),
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TemplateError::NotFound => write!(f, "Template preset not found"),
            TemplateError::PresetLimitReached => write!(
                f,
                "Template preset limit reached ({} per kind)",
                TEMPLATE_PRESET_LIMIT
            ),
            TemplateError::Validation(msg) => write!(f, "{}", msg),
            TemplateError::Repository(e) => write!(f, "Repository error: {}", e),
        }
    }
}

impl std::error::Error for TemplateError {}

impl From<RepositoryError> for TemplateError {
    fn from(error: RepositoryError) -> Self {
        TemplateError::Repository(error)
    }
}

pub type Result<T> = std::result::Result<T, TemplateError>;

/// Preset storage plus the rendering entry points. Rendering itself never
/// fails; preset creation and deletion validate loudly.
pub struct TemplateService {
    preset_repo: Arc<dyn TemplatePresetRepository>,
    timezone_service: Arc<TimezoneService>,
}

impl TemplateService {
    pub fn new(
        preset_repo: Arc<dyn TemplatePresetRepository>,
        timezone_service: Arc<TimezoneService>,
    ) -> Self {
        Self {
            preset_repo,
            timezone_service,
        }
    }

    pub async fn create_preset(
        &self,
        user_id: i64,
        kind: PresetKind,
        name: String,
        body: String,
    ) -> Result<i64> {
        if name.trim().is_empty() {
            return Err(TemplateError::Validation(
                "Preset name cannot be empty".to_string(),
            ));
        }

        let existing = self.preset_repo.count_by_user_kind(user_id, kind).await?;
        if existing >= TEMPLATE_PRESET_LIMIT {
            return Err(TemplateError::PresetLimitReached);
        }

        let preset = TemplatePreset::new(user_id, kind, name, body);
        Ok(self.preset_repo.add(preset).await?)
    }

    pub async fn list_presets(&self, user_id: i64, kind: PresetKind) -> Result<Vec<TemplatePreset>> {
        Ok(self.preset_repo.list_by_user_kind(user_id, kind).await?)
    }

    pub async fn delete_preset(&self, user_id: i64, preset_id: i64) -> Result<()> {
        let preset = self
            .preset_repo
            .get(preset_id)
            .await?
            .filter(|p| p.user_id == user_id)
            .ok_or(TemplateError::NotFound)?;

        self.preset_repo.delete(preset.id).await?;
        Ok(())
    }

    /// Expands arbitrary template text for a user. The reference date is
    /// the caller's pick (usually a task due date); when omitted it is
    /// "today" in the user's resolved zone.
    pub async fn render_text(
        &self,
        user_id: i64,
        input: &str,
        reference: Option<NaiveDate>,
    ) -> String {
        let reference = match reference {
            Some(date) => date,
            None => self.timezone_service.today_for_user(user_id).await,
        };
        render_template(input, reference)
    }

    /// Expands a stored preset owned by the user.
    pub async fn render_preset(
        &self,
        user_id: i64,
        preset_id: i64,
        reference: Option<NaiveDate>,
    ) -> Result<String> {
        let preset = self
            .preset_repo
            .get(preset_id)
            .await?
            .filter(|p| p.user_id == user_id)
            .ok_or(TemplateError::NotFound)?;

        Ok(self.render_text(user_id, &preset.body, reference).await)
    }
}
