use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::domain::repositories::{RepositoryError, UserPreferencesRepository};
use crate::domain::entities::user_preferences::UserPreferences;
use crate::infrastructure::timezone::{
    calendar_day_of, is_valid_time_zone, resolve_effective_time_zone, today_in,
};

#[derive(Debug)]
pub enum TimezoneError {
    InvalidTimezone(String),
    RepositoryError(RepositoryError),
}

impl std::fmt::Display for TimezoneError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TimezoneError::InvalidTimezone(name) => write!(f, "Invalid timezone: {}", name),
            TimezoneError::RepositoryError(e) => write!(f, "Repository error: {}", e),
        }
    }
}

impl std::error::Error for TimezoneError {}

impl From<RepositoryError> for TimezoneError {
    fn from(error: RepositoryError) -> Self {
        TimezoneError::RepositoryError(error)
    }
}

pub type Result<T> = std::result::Result<T, TimezoneError>;

/// Per-user view over the timezone resolver: the stored preference feeds the
/// preference -> runtime default -> UTC fallback chain.
pub struct TimezoneService {
    user_prefs_repo: Arc<dyn UserPreferencesRepository>,
}

impl TimezoneService {
    pub fn new(user_prefs_repo: Arc<dyn UserPreferencesRepository>) -> Self {
        Self { user_prefs_repo }
    }

    /// Set the time zone preference for a user; the name is validated
    /// loudly here, at the write boundary.
    pub async fn set_user_timezone(&self, user_id: i64, timezone_str: &str) -> Result<()> {
        let trimmed = timezone_str.trim();
        if !is_valid_time_zone(trimmed) {
            return Err(TimezoneError::InvalidTimezone(trimmed.to_string()));
        }

        let preferences = match self.user_prefs_repo.get(user_id).await? {
            Some(mut prefs) => {
                prefs.update_timezone(Some(trimmed.to_string()));
                prefs
            }
            None => UserPreferences::new(user_id, Some(trimmed.to_string())),
        };

        self.user_prefs_repo
            .save(&preferences)
            .await
            .map_err(TimezoneError::from)
    }

    pub async fn get_user_timezone(&self, user_id: i64) -> Result<Option<String>> {
        Ok(self
            .user_prefs_repo
            .get(user_id)
            .await?
            .and_then(|prefs| prefs.timezone))
    }

    /// The zone all of this user's day computations run in. Read path:
    /// a missing or unreadable preference falls back silently.
    pub async fn effective_time_zone(&self, user_id: i64) -> Tz {
        let preference = match self.user_prefs_repo.get(user_id).await {
            Ok(Some(prefs)) => prefs.timezone,
            _ => None,
        };
        resolve_effective_time_zone(preference.as_deref())
    }

    /// Today's calendar date as this user sees it.
    pub async fn today_for_user(&self, user_id: i64) -> NaiveDate {
        today_in(self.effective_time_zone(user_id).await)
    }

    /// The calendar date of an arbitrary instant as this user sees it.
    pub async fn calendar_day_for_user(&self, user_id: i64, instant: DateTime<Utc>) -> NaiveDate {
        calendar_day_of(instant, self.effective_time_zone(user_id).await)
    }
}
