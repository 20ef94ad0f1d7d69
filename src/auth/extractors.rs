use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use crate::auth::repo_types::User;
use crate::errors::AppError;
use crate::state::AppState;

/// Extracts the bearer token and resolves it to the owning user. Missing
/// header, unknown token and expired token all reject with the same opaque
/// `Unauthorized`.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Read Authorization header
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        // Expect "Bearer <token>"
        let plaintext = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(AppError::Unauthorized)?;

        match state.auth.authenticate(plaintext).await {
            Ok(user) => Ok(AuthUser(user)),
            Err(AppError::Unauthorized) => {
                warn!("request with invalid or expired token");
                Err(AppError::Unauthorized)
            }
            Err(e) => Err(e),
        }
    }
}
