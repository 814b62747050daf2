use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use serde_json::json;
use thiserror::Error;

/// Failures surfaced by the signup, login and contact operations.
///
/// Every variant maps to one HTTP status; `Internal` hides its cause from the
/// client and logs it instead.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("too many attempts, request a new code")]
    RateLimited,

    #[error("invalid verification code")]
    InvalidCode,

    #[error("{0}")]
    Conflict(String),

    #[error("account is not verified")]
    NotVerified,

    #[error("password does not match")]
    InvalidCredentials,

    #[error("failed to deliver message: {0}")]
    Delivery(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn no_pending_signup() -> Self {
        Self::NotFound("no pending signup".to_string())
    }

    pub fn user_not_found() -> Self {
        Self::NotFound("user not found".to_string())
    }

    pub fn already_exists() -> Self {
        Self::Conflict("user already exists".to_string())
    }
}

/// Persistence failures shared by the pending-signup and user stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint (phone or email) rejected the write.
    #[error("duplicate key")]
    Duplicate,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Classifies a sqlx error, pulling unique-violation failures out as `Duplicate`.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::Duplicate;
            }
        }
        Self::Database(err)
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                errs.first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
            .collect();
        messages.sort();
        Self::Validation(messages.join("; "))
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidCode => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotVerified => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Delivery(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Self::Internal(cause) => {
                error!("❌ Internal error: {}", cause);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            AuthError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::InvalidCode.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::no_pending_signup().status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AuthError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(AuthError::already_exists().status_code(), StatusCode::CONFLICT);
        assert_eq!(AuthError::NotVerified.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::Delivery("down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AuthError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_errors_become_internal() {
        let err: AuthError = StoreError::Duplicate.into();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[test]
    fn internal_error_body_hides_cause() {
        let resp = AuthError::Internal("connection refused".into()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
