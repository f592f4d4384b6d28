/// Failures raised by the ingestion and aggregation services.
///
/// Only `Validation` is the caller's fault in a way the HTTP layer reports as
/// a 400; the rest surface as 500 with their message.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("line {line}: {message}")]
    Parse { line: u64, message: String },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
