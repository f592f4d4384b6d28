// Error type returned by every handler; renders the JSON error envelope

use crate::api::models::ErrorBody;
use crate::database_ops::ServiceError;
use actix_web::{error::QueryPayloadError, http::StatusCode, HttpRequest, HttpResponse, ResponseError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Internal(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        if err.is_validation() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), detail = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), detail = %self, "request rejected");
        }
        HttpResponse::build(status).json(ErrorBody::new(self.to_string()))
    }
}

/// Query-string deserialization failures (e.g. `limit=abc`) as JSON 400s.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(format!("Invalid query parameters: {err}")).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_two_tiers() {
        let bad = ApiError::from(ServiceError::validation("missing columns"));
        assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(bad.to_string(), "missing columns");

        let parse = ApiError::from(ServiceError::Parse {
            line: 4,
            message: "`quantity` must be an integer, got `x`".into(),
        });
        assert_eq!(parse.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(parse.to_string().starts_with("line 4: "));

        let db = ApiError::from(ServiceError::Database(sqlx::Error::RowNotFound));
        assert_eq!(db.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
