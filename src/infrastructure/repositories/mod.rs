pub mod sqlite_dispatch_repository;
pub mod sqlite_task_repository;
pub mod sqlite_template_preset_repository;
pub mod sqlite_user_preferences_repository;

pub use sqlite_dispatch_repository::SqliteDispatchRepository;
pub use sqlite_task_repository::SqliteTaskRepository;
pub use sqlite_template_preset_repository::SqliteTemplatePresetRepository;
pub use sqlite_user_preferences_repository::SqliteUserPreferencesRepository;

use crate::domain::repositories::RepositoryError;

/// Collapses an anyhow chain from DatabaseManager into a repository error.
pub(crate) fn storage_err(error: anyhow::Error) -> RepositoryError {
    RepositoryError::StorageError(format!("{error:#}"))
}

/// Wraps a value conversion failure so it can travel through a rusqlite row
/// mapper; used when a stored value is syntactically valid SQL but not a
/// valid domain value.
pub(crate) fn conversion_err(msg: String) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::other(msg)))
}
