use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::{TokenStore, UserStore};
use crate::auth::repo_types::User;
use crate::auth::token::{Token, KNOWN_SCOPES, SCOPE_AUTH};
use crate::errors::AppError;

pub(crate) fn validate_email(email: &str) -> Result<(), AppError> {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    }
    if email.is_empty() {
        return Err(AppError::Validation("email is required".into()));
    }
    if email.len() > 255 {
        return Err(AppError::Validation(
            "email cannot be longer than 255 characters".into(),
        ));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(AppError::Validation("email must be a valid address".into()));
    }
    Ok(())
}

fn validate_scope(scope: &str) -> Result<(), AppError> {
    if !KNOWN_SCOPES.contains(&scope) {
        return Err(AppError::Validation(format!("unknown token scope: {scope}")));
    }
    Ok(())
}

/// Credential checks and token lifecycle, stateless apart from the injected
/// store handles.
#[derive(Clone)]
pub struct AuthService {
    users: UserStore,
    tokens: TokenStore,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(users: UserStore, tokens: TokenStore, token_ttl: Duration) -> Self {
        Self {
            users,
            tokens,
            token_ttl,
        }
    }

    /// Validate, hash, insert. Uniqueness is left entirely to the store's
    /// constraint; a `Conflict` from it surfaces unchanged.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AppError> {
        validate_email(email)?;
        if password.is_empty() {
            return Err(AppError::Validation("password is required".into()));
        }
        let password_hash = hash_password(password)?;
        self.users.create(email, &password_hash).await
    }

    /// Check credentials and mint a token. The two failure legs below return
    /// the same `Unauthorized`; only the operator logs tell them apart.
    pub async fn login(&self, email: &str, password: &str) -> Result<(Token, User), AppError> {
        let user = match self.users.get_by_email(email).await? {
            Some(user) => user,
            None => {
                warn!(email = %email, "login attempt for unknown email");
                return Err(AppError::Unauthorized);
            }
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "login attempt with wrong password");
            return Err(AppError::Unauthorized);
        }

        let token = self
            .tokens
            .create_new(user.id, self.token_ttl, SCOPE_AUTH)
            .await?;
        Ok((token, user))
    }

    /// Resolve a presented bearer plaintext to its owner. Unknown and
    /// expired tokens are both a plain `Unauthorized`.
    pub async fn authenticate(&self, plaintext: &str) -> Result<User, AppError> {
        self.users
            .get_for_token(SCOPE_AUTH, plaintext)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Revoke every token the user holds under the given scope.
    pub async fn revoke_all(&self, user_id: Uuid, scope: &str) -> Result<(), AppError> {
        validate_scope(scope)?;
        self.tokens.delete_all_for_user(user_id, scope).await
    }

    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        self.tokens.purge_expired().await
    }
}

/// Background reaper for expired token rows. Reads never depend on it; it
/// only keeps the table from growing without bound.
pub fn spawn_purge_task(service: AuthService) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match service.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "purged expired tokens"),
                Err(e) => error!(error = %e, "token purge failed"),
            }
        }
    });
}
