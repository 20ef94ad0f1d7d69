use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Every failure the crate can produce. Callers match on the variant, not on
/// message strings.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input: bad email syntax, empty password, unknown scope.
    #[error("{0}")]
    Validation(String),

    /// A store uniqueness constraint fired, e.g. a duplicate email.
    #[error("{0} already exists")]
    Conflict(&'static str),

    /// The referenced record does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Credential or token check failed. Deliberately carries no detail.
    #[error("invalid credentials")]
    Unauthorized,

    /// The password hashing primitive itself failed.
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// The OS randomness source could not produce token bytes.
    #[error("entropy source failed: {0}")]
    Entropy(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// Maps a unique-constraint violation to `Conflict(resource)`; anything
    /// else stays a database error.
    pub fn from_sqlx(e: sqlx::Error, resource: &'static str) -> Self {
        let unique = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if unique {
            AppError::Conflict(resource)
        } else {
            AppError::Database(e)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(what) => {
                (StatusCode::CONFLICT, format!("{what} already exists"))
            }
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "invalid credentials".to_string())
            }
            // Internal failures are logged with detail but answered opaquely.
            AppError::Hashing(detail) => {
                error!(error = %detail, "password hashing failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            AppError::Entropy(detail) => {
                error!(error = %detail, "entropy source failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            AppError::Database(e) => {
                error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn validation_maps_to_400() {
        let err = AppError::Validation("email is required".into());
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn conflict_maps_to_409() {
        assert_eq!(status_of(AppError::Conflict("email")), StatusCode::CONFLICT);
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(status_of(AppError::NotFound("user")), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unauthorized_maps_to_401() {
        assert_eq!(status_of(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn internal_kinds_map_to_500() {
        assert_eq!(
            status_of(AppError::Hashing("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::Entropy("no rng".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::Database(sqlx::Error::RowNotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn internal_error_body_is_opaque() {
        let resp = AppError::Hashing("argon2 parameter error".into()).into_response();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("argon2"));
        assert!(text.contains("internal server error"));
    }

    #[tokio::test]
    async fn unauthorized_body_carries_no_detail() {
        let resp = AppError::Unauthorized.into_response();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(text, r#"{"error":"invalid credentials"}"#);
    }

    #[test]
    fn unique_violation_becomes_conflict_passthrough_otherwise() {
        let err = AppError::from_sqlx(sqlx::Error::RowNotFound, "email");
        assert!(matches!(err, AppError::Database(_)));
    }
}
