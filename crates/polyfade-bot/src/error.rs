//! Application error types.

use thiserror::Error;

/// Top-level application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] polyfade_persistence::PersistenceError),

    #[error("Engine error: {0}")]
    Engine(String),
}

/// Result type alias for application operations.
pub type AppResult<T> = std::result::Result<T, AppError>;
