pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Errors that mean the upstream store can no longer be trusted for the
    /// rest of the run. Everything else is scoped to a single record.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Unavailable(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            sqlx::Error::Io(e) => Error::Unavailable(e.to_string()),
            sqlx::Error::Tls(e) => Error::Unavailable(e.to_string()),
            sqlx::Error::PoolTimedOut => {
                Error::Unavailable("timed out acquiring a database connection".to_string())
            }
            sqlx::Error::PoolClosed => Error::Unavailable("database pool is closed".to_string()),
            other => Error::Database(other),
        }
    }
}
