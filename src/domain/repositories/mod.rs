pub mod dispatch_repository;
pub mod task_repository;
pub mod template_preset_repository;
pub mod user_preferences_repository;

use std::fmt;

pub use dispatch_repository::DispatchRepository;
pub use task_repository::TaskRepository;
pub use template_preset_repository::TemplatePresetRepository;
pub use user_preferences_repository::UserPreferencesRepository;

#[derive(Debug)]
pub enum RepositoryError {
    NotFound,
    InvalidData(String),
    StorageError(String),
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RepositoryError::NotFound => write!(f, "Record not found"),
            RepositoryError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            RepositoryError::StorageError(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

pub type Result<T> = std::result::Result<T, RepositoryError>;
