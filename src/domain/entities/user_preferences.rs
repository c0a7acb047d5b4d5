use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: i64,
    /// IANA zone name, e.g. "Europe/Madrid". `None` means "use the runtime
    /// default"; the resolver handles the fallback chain.
    pub timezone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserPreferences {
    pub fn new(user_id: i64, timezone: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            timezone,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_timezone(&mut self, new_timezone: Option<String>) {
        self.timezone = new_timezone;
        self.updated_at = Utc::now();
    }
}

impl PartialEq for UserPreferences {
    fn eq(&self, other: &Self) -> bool {
        self.user_id == other.user_id
    }
}
