use service_core::error::AppError;
use thiserror::Error;

/// Failure kinds raised by the core services.
///
/// A cache miss is never an error: lookups return `Ok(None)`.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Validation error: {0}")]
    ValidationMessage(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Create failed: {0:#}")]
    Create(anyhow::Error),

    #[error("Update failed: {0:#}")]
    Update(anyhow::Error),

    #[error("Delete failed: {0:#}")]
    Delete(anyhow::Error),

    #[error("Database error: {0:#}")]
    Database(anyhow::Error),

    #[error("Cache key or value missing: {0}")]
    CacheKeyOrValueMissing(String),

    #[error("Cache error: {0:#}")]
    Cache(anyhow::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User has no rights")]
    NoRights,

    #[error("Operation cancelled")]
    Cancelled,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => AppError::ValidationError(e),
            ServiceError::ValidationMessage(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::InvalidArgument(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::CacheKeyOrValueMissing(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::NotFound(e) => AppError::NotFound(anyhow::anyhow!(e)),
            ServiceError::Create(e) => AppError::DatabaseError(e.context("Create failed")),
            ServiceError::Update(e) => AppError::DatabaseError(e.context("Update failed")),
            ServiceError::Delete(e) => AppError::DatabaseError(e.context("Delete failed")),
            ServiceError::Database(e) => AppError::DatabaseError(e),
            ServiceError::Cache(e) => AppError::InternalError(e.context("Cache failure")),
            ServiceError::Serialization(e) => AppError::InternalError(anyhow::Error::new(e)),
            ServiceError::Token(e) => AppError::InternalError(anyhow::Error::new(e)),
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Password does not match the user"))
            }
            ServiceError::NoRights => {
                AppError::Forbidden(anyhow::anyhow!("User has no rights to use the systems"))
            }
            ServiceError::Cancelled => AppError::ServiceUnavailable,
        }
    }
}

/// Bail out with [`ServiceError::Cancelled`] once the token has fired.
pub(crate) fn ensure_active(
    cancel: &tokio_util::sync::CancellationToken,
) -> Result<(), ServiceError> {
    if cancel.is_cancelled() {
        return Err(ServiceError::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_core::axum::{http::StatusCode, response::IntoResponse};

    fn status_of(err: ServiceError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn kinds_map_to_distinct_statuses() {
        assert_eq!(
            status_of(ServiceError::NotFound("game".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ServiceError::InvalidArgument("blank".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ServiceError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(ServiceError::NoRights), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(ServiceError::Create(anyhow::anyhow!("duplicate"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ServiceError::Cancelled),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn cancelled_token_is_detected() {
        let cancel = tokio_util::sync::CancellationToken::new();
        assert!(ensure_active(&cancel).is_ok());
        cancel.cancel();
        assert!(matches!(ensure_active(&cancel), Err(ServiceError::Cancelled)));
    }
}
