use async_trait::async_trait;

use crate::domain::entities::user_preferences::UserPreferences;
use crate::domain::repositories::Result;

#[async_trait]
pub trait UserPreferencesRepository: Send + Sync {
    /// Obtain user's preferences by user ID
    async fn get(&self, user_id: i64) -> Result<Option<UserPreferences>>;

    /// Save or update user's preferences
    async fn save(&self, preferences: &UserPreferences) -> Result<()>;

    /// Delete user's preferences by user ID
    async fn delete(&self, user_id: i64) -> Result<()>;

    /// Check if a preference for an user already exists
    async fn exists(&self, user_id: i64) -> Result<bool> {
        match self.get(user_id).await {
            Ok(Some(_)) => Ok(true),
            Ok(None) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
