//! Email confirmation tokens and the messages that carry them.
//!
//! A pending confirmation is an opaque, URL-safe token plus an expiry. It is
//! checked by exact match against the stored value and against the clock at
//! check time.

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{
    auth::{errors::AuthError, repo_types::User},
    email::EmailMessage,
};

pub const CONFIRM_SUBJECT: &str = "Confirm your email";
pub const RESEND_SUBJECT: &str = "Resend: Confirm your email";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    pub token: String,
    pub expires: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct ConfirmationIssuer {
    base_url: String,
    ttl: Duration,
}

impl ConfirmationIssuer {
    pub fn new(base_url: impl Into<String>, ttl: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, ttl }
    }

    pub fn issue(&self, now: OffsetDateTime) -> PendingConfirmation {
        PendingConfirmation {
            token: Uuid::new_v4().to_string(),
            expires: now + self.ttl,
        }
    }

    /// `<base-url>/confirm?email=<urlencoded-email>&token=<token>`
    pub fn link(&self, email: &str, token: &str) -> String {
        format!(
            "{}/confirm?email={}&token={}",
            self.base_url,
            urlencoding::encode(email),
            urlencoding::encode(token)
        )
    }

    pub fn initial_message(&self, email: &str, token: &str) -> EmailMessage {
        let link = self.link(email, token);
        EmailMessage {
            to: email.to_string(),
            subject: CONFIRM_SUBJECT.to_string(),
            html_body: format!(
                "<p>Please confirm your email by clicking <a href='{link}'>here</a>.</p>"
            ),
        }
    }

    pub fn resend_message(&self, email: &str, token: &str) -> EmailMessage {
        let link = self.link(email, token);
        EmailMessage {
            to: email.to_string(),
            subject: RESEND_SUBJECT.to_string(),
            html_body: format!(
                "<p>Hi again!</p><p>Please <a href='{link}'>click here to confirm your email</a>.</p>"
            ),
        }
    }
}

/// Validates `token` against the user's pending pair without mutating it.
pub fn check(user: &User, token: &str, now: OffsetDateTime) -> Result<(), AuthError> {
    match (
        user.email_confirmation_token.as_deref(),
        user.email_confirmation_token_expires,
    ) {
        (Some(stored), Some(expires)) if stored == token => {
            if expires < now {
                Err(AuthError::TokenExpired)
            } else {
                Ok(())
            }
        }
        _ => Err(AuthError::InvalidCredential),
    }
}
