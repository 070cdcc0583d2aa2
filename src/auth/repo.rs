use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};

/// Persistence of user credentials, keyed by normalized email or id.
///
/// Every method that changes a confirmation or refresh pair is a single
/// compare-and-swap: the condition is checked and the pair written in one
/// step, and the `bool` result says whether this caller won.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool>;

    /// Returns `None` when the email is already taken.
    async fn insert(&self, user: NewUser) -> anyhow::Result<Option<User>>;

    /// Marks the user confirmed and clears the pending pair, provided `token`
    /// is still the pending one and has not expired at `now`.
    async fn confirm_email(&self, id: Uuid, token: &str, now: OffsetDateTime)
        -> anyhow::Result<bool>;

    /// Replaces the pending pair; refuses once the user is confirmed.
    async fn replace_confirmation(
        &self,
        id: Uuid,
        token: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<bool>;

    async fn set_refresh_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expiry: OffsetDateTime,
    ) -> anyhow::Result<()>;

    /// Swaps `old_hash` for `new_hash` only if `old_hash` is the live token.
    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        old_hash: &str,
        new_hash: &str,
        expiry: OffsetDateTime,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool>;

    async fn clear_refresh_token(&self, id: Uuid) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, is_email_confirmed,
                   email_confirmation_token, email_confirmation_token_expires,
                   refresh_token, refresh_token_expiry, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool> {
        let exists: bool =
            sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)"#)
                .bind(email)
                .fetch_one(&self.db)
                .await
                .context("check user exists")?;
        Ok(exists)
    }

    async fn insert(&self, user: NewUser) -> anyhow::Result<Option<User>> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, role, is_email_confirmed,
                               email_confirmation_token, email_confirmation_token_expires,
                               created_at)
            VALUES ($1, $2, $3, $4, FALSE, $5, $6, $7)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, password_hash, role, is_email_confirmed,
                      email_confirmation_token, email_confirmation_token_expires,
                      refresh_token, refresh_token_expiry, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.email_confirmation_token)
        .bind(user.email_confirmation_token_expires)
        .bind(user.created_at)
        .fetch_optional(&self.db)
        .await
        .context("insert user")?;
        Ok(created)
    }

    async fn confirm_email(
        &self,
        id: Uuid,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET is_email_confirmed = TRUE,
                   email_confirmation_token = NULL,
                   email_confirmation_token_expires = NULL
             WHERE id = $1
               AND email_confirmation_token = $2
               AND email_confirmation_token_expires >= $3
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(now)
        .execute(&self.db)
        .await
        .context("confirm email")?;
        Ok(res.rows_affected() == 1)
    }

    async fn replace_confirmation(
        &self,
        id: Uuid,
        token: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET email_confirmation_token = $2,
                   email_confirmation_token_expires = $3
             WHERE id = $1 AND is_email_confirmed = FALSE
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expires)
        .execute(&self.db)
        .await
        .context("replace confirmation token")?;
        Ok(res.rows_affected() == 1)
    }

    async fn set_refresh_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expiry: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"UPDATE users SET refresh_token = $2, refresh_token_expiry = $3 WHERE id = $1"#,
        )
        .bind(id)
        .bind(token_hash)
        .bind(expiry)
        .execute(&self.db)
        .await
        .context("set refresh token")?;
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        old_hash: &str,
        new_hash: &str,
        expiry: OffsetDateTime,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        // Row lock taken by UPDATE serializes racing rotations; the loser sees
        // the new digest and matches nothing.
        let res = sqlx::query(
            r#"
            UPDATE users
               SET refresh_token = $3,
                   refresh_token_expiry = $4
             WHERE id = $1
               AND refresh_token = $2
               AND refresh_token_expiry >= $5
            "#,
        )
        .bind(id)
        .bind(old_hash)
        .bind(new_hash)
        .bind(expiry)
        .bind(now)
        .execute(&self.db)
        .await
        .context("rotate refresh token")?;
        Ok(res.rows_affected() == 1)
    }

    async fn clear_refresh_token(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"UPDATE users SET refresh_token = NULL, refresh_token_expiry = NULL WHERE id = $1"#,
        )
        .bind(id)
        .execute(&self.db)
        .await
        .context("clear refresh token")?;
        Ok(())
    }
}
