use std::time::Duration;

use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::auth::token::{self, Token};
use crate::errors::AppError;

/// Access to the `users` table. Holds nothing but the injected pool handle.
#[derive(Clone)]
pub struct UserStore {
    db: PgPool,
}

impl UserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Insert a new user. Email uniqueness is enforced by the table's unique
    /// constraint; a violation maps to `Conflict`.
    pub async fn create(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        if password_hash.is_empty() {
            return Err(AppError::Validation("password hash is required".into()));
        }
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_sqlx(e, "email"))?;
        Ok(user)
    }

    /// An absent user is a valid negative result, not an error.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    /// Update email and password hash by id. Renaming onto a taken email is a
    /// `Conflict`; a vanished row is `NotFound`.
    pub async fn update(&self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $1, password_hash = $2
            WHERE id = $3
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.id)
        .execute(&self.db)
        .await
        .map_err(|e| AppError::from_sqlx(e, "email"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("user"));
        }
        Ok(())
    }

    /// Resolve the owner of a live token: derive the lookup hash from the
    /// presented plaintext and join, accepting only rows whose expiry is
    /// still in the future. Expired rows the reaper has not collected yet
    /// are therefore invisible here.
    pub async fn get_for_token(
        &self,
        scope: &str,
        plaintext: &str,
    ) -> Result<Option<User>, AppError> {
        let hash = token::hash_token(plaintext);
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.created_at
            FROM users u
            INNER JOIN tokens t ON t.user_id = u.id
            WHERE t.hash = $1 AND t.scope = $2 AND t.expiry > $3
            "#,
        )
        .bind(&hash)
        .bind(scope)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}

/// Access to the `tokens` table.
#[derive(Clone)]
pub struct TokenStore {
    db: PgPool,
}

impl TokenStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Persist a minted token. Only the hash is written; the plaintext never
    /// reaches the store. The hash is the primary key, so a collision
    /// surfaces as `Conflict`.
    pub async fn insert(&self, token: &Token) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO tokens (hash, user_id, scope, expiry)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&token.hash)
        .bind(token.user_id)
        .bind(&token.scope)
        .bind(token.expiry)
        .execute(&self.db)
        .await
        .map_err(|e| AppError::from_sqlx(e, "token"))?;
        Ok(())
    }

    /// Mint and persist in one call. The plaintext leaves this function only
    /// through the returned value.
    pub async fn create_new(
        &self,
        user_id: Uuid,
        ttl: Duration,
        scope: &str,
    ) -> Result<Token, AppError> {
        let token = token::generate(user_id, ttl, scope)?;
        self.insert(&token).await?;
        Ok(token)
    }

    /// Delete every token a user holds under one scope. Matching zero rows
    /// is still success.
    pub async fn delete_all_for_user(&self, user_id: Uuid, scope: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            DELETE FROM tokens
            WHERE user_id = $1 AND scope = $2
            "#,
        )
        .bind(user_id)
        .bind(scope)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Remove rows past their expiry. Reads already exclude them, so this
    /// only reclaims space; returns how many rows went away.
    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM tokens
            WHERE expiry <= $1
            "#,
        )
        .bind(OffsetDateTime::now_utc())
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }
}
