use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// A catalog query failed. Displays as the bare message so it can be
    /// shown to the user as-is.
    #[error("{0}")]
    QueryFailed(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AppError {
    /// Collapse a backend failure into the single kind surfaced to views.
    pub fn query_failed(err: impl std::fmt::Display) -> Self {
        Self::QueryFailed(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
