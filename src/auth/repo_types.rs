use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::claims::Role;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,                // normalized, unique
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 PHC string, never exposed
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub is_email_confirmed: bool,
    #[serde(skip_serializing)]
    pub email_confirmation_token: Option<String>,
    pub email_confirmation_token_expires: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>, // SHA-256 hex digest
    pub refresh_token_expiry: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Fields supplied when a user registers.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub email_confirmation_token: String,
    pub email_confirmation_token_expires: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

impl From<NewUser> for User {
    fn from(n: NewUser) -> Self {
        Self {
            id: n.id,
            email: n.email,
            password_hash: n.password_hash,
            role: n.role,
            is_email_confirmed: false,
            email_confirmation_token: Some(n.email_confirmation_token),
            email_confirmation_token_expires: Some(n.email_confirmation_token_expires),
            refresh_token: None,
            refresh_token_expiry: None,
            created_at: n.created_at,
        }
    }
}
