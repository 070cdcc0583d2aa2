use std::sync::Arc;

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        claims::Role,
        confirmation::{self, ConfirmationIssuer},
        dto::{Registered, TokenPair},
        errors::{AuthError, AuthResult},
        jwt::{generate_refresh_token, hash_refresh_token, JwtKeys},
        password::{hash_password, verify_against_dummy, verify_password, MIN_PASSWORD_LEN},
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    clock::Clock,
    config::AppConfig,
    email::EmailSender,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Lookup key for every operation: trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub refresh_ttl: Duration,
    pub confirmation_ttl: Duration,
    pub public_base_url: String,
}

impl From<&AppConfig> for AuthSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            refresh_ttl: Duration::days(cfg.jwt.refresh_ttl_days),
            confirmation_ttl: Duration::hours(cfg.email.confirmation_ttl_hours),
            public_base_url: cfg.email.public_base_url.clone(),
        }
    }
}

/// Registration, confirmation and session lifecycle of user accounts.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    sender: Arc<dyn EmailSender>,
    keys: JwtKeys,
    confirmations: ConfirmationIssuer,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        sender: Arc<dyn EmailSender>,
        keys: JwtKeys,
        settings: AuthSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            sender,
            keys,
            confirmations: ConfirmationIssuer::new(
                settings.public_base_url,
                settings.confirmation_ttl,
            ),
            refresh_ttl: settings.refresh_ttl,
            clock,
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    /// Creates an unconfirmed account and mails its confirmation link.
    ///
    /// A failed send is logged and does not undo the account; the user can
    /// ask for another link with [`AuthService::resend_confirmation`].
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> AuthResult<Registered> {
        let role = Role::parse_requested(role)
            .map_err(|e| AuthError::invalid_input(e.to_string()))?;
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email");
            return Err(AuthError::invalid_input("Invalid email format"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::invalid_input(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if self.store.exists_by_email(&email).await? {
            warn!(email = %email, "email already registered");
            return Err(AuthError::Conflict);
        }

        let plain = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&plain))
            .await
            .context("password hashing task")??;

        let now = self.clock.now();
        let pending = self.confirmations.issue(now);
        let new_user = NewUser {
            id: Uuid::new_v4(),
            email: email.clone(),
            password_hash,
            role,
            email_confirmation_token: pending.token.clone(),
            email_confirmation_token_expires: pending.expires,
            created_at: now,
        };

        // The unique index decides races between concurrent registrations.
        let Some(user) = self.store.insert(new_user).await? else {
            warn!(email = %email, "email registered concurrently");
            return Err(AuthError::Conflict);
        };

        let message = self.confirmations.initial_message(&user.email, &pending.token);
        let confirmation_sent = match self.sender.send(&message).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, user_id = %user.id, "confirmation email not sent");
                false
            }
        };

        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(Registered {
            user_id: user.id,
            email: user.email,
            confirmation_sent,
        })
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<TokenPair> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::invalid_input("Email and password are required"));
        }

        let Some(user) = self.store.find_by_email(&email).await? else {
            let plain = password.to_owned();
            tokio::task::spawn_blocking(move || verify_against_dummy(&plain))
                .await
                .context("password verification task")?;
            warn!(email = %email, "login unknown email");
            return Err(AuthError::InvalidCredential);
        };

        if !user.is_email_confirmed {
            warn!(user_id = %user.id, "login before email confirmation");
            return Err(AuthError::EmailNotConfirmed);
        }

        let plain = password.to_owned();
        let hash = user.password_hash.clone();
        let ok = tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
            .await
            .context("password verification task")??;
        if !ok {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredential);
        }

        let now = self.clock.now();
        let access_token = self.keys.sign_access(user.id, &user.email, user.role, now)?;
        let refresh_token = generate_refresh_token();
        let expiry = now + self.refresh_ttl;
        self.store
            .set_refresh_token(user.id, &hash_refresh_token(&refresh_token), expiry)
            .await?;

        info!(user_id = %user.id, "user logged in");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    #[instrument(skip(self, token))]
    pub async fn confirm_email(&self, email: &str, token: &str) -> AuthResult<()> {
        let email = normalize_email(email);
        let Some(user) = self.store.find_by_email(&email).await? else {
            warn!(email = %email, "confirm unknown email");
            return Err(AuthError::InvalidCredential);
        };

        let now = self.clock.now();
        if let Err(e) = confirmation::check(&user, token, now) {
            warn!(user_id = %user.id, code = e.code(), "confirmation rejected");
            return Err(e);
        }

        // Lost a race with another confirm or a resend.
        if !self.store.confirm_email(user.id, token, now).await? {
            warn!(user_id = %user.id, "confirmation token consumed concurrently");
            return Err(AuthError::InvalidCredential);
        }

        info!(user_id = %user.id, "email confirmed");
        Ok(())
    }

    /// Replaces the pending token and mails it. The new token is stored
    /// before sending, so a `DeliveryFailed` caller may simply retry.
    #[instrument(skip(self))]
    pub async fn resend_confirmation(&self, email: &str) -> AuthResult<()> {
        let email = normalize_email(email);
        let Some(user) = self.store.find_by_email(&email).await? else {
            return Err(AuthError::NotFound);
        };
        if user.is_email_confirmed {
            return Err(AuthError::AlreadyConfirmed);
        }

        let pending = self.confirmations.issue(self.clock.now());
        if !self
            .store
            .replace_confirmation(user.id, &pending.token, pending.expires)
            .await?
        {
            return Err(AuthError::AlreadyConfirmed);
        }

        let message = self.confirmations.resend_message(&user.email, &pending.token);
        if let Err(e) = self.sender.send(&message).await {
            warn!(error = %e, user_id = %user.id, "confirmation resend failed");
            return Err(AuthError::DeliveryFailed);
        }

        info!(user_id = %user.id, "confirmation email resent");
        Ok(())
    }

    /// Exchanges a live refresh token for a new pair; the old token stops
    /// working in the same store update that activates the new one.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_token(&self, email: &str, refresh_token: &str) -> AuthResult<TokenPair> {
        let email = normalize_email(email);
        let now = self.clock.now();
        let presented = hash_refresh_token(refresh_token);

        let user = self
            .store
            .find_by_email(&email)
            .await?
            .filter(|u| refresh_is_live(u, &presented, now))
            .ok_or_else(|| {
                warn!(email = %email, "refresh rejected");
                AuthError::InvalidCredential
            })?;

        let new_token = generate_refresh_token();
        let expiry = now + self.refresh_ttl;
        let rotated = self
            .store
            .rotate_refresh_token(user.id, &presented, &hash_refresh_token(&new_token), expiry, now)
            .await?;
        if !rotated {
            warn!(user_id = %user.id, "refresh token rotated concurrently");
            return Err(AuthError::InvalidCredential);
        }

        let access_token = self.keys.sign_access(user.id, &user.email, user.role, now)?;
        info!(user_id = %user.id, "refresh token rotated");
        Ok(TokenPair {
            access_token,
            refresh_token: new_token,
        })
    }

    #[instrument(skip(self))]
    pub async fn logout(&self, email: &str) -> AuthResult<()> {
        let email = normalize_email(email);
        let Some(user) = self.store.find_by_email(&email).await? else {
            return Err(AuthError::NotFound);
        };
        self.store.clear_refresh_token(user.id).await?;
        info!(user_id = %user.id, "user logged out");
        Ok(())
    }
}

fn refresh_is_live(user: &User, presented_hash: &str, now: time::OffsetDateTime) -> bool {
    match (user.refresh_token.as_deref(), user.refresh_token_expiry) {
        (Some(stored), Some(expiry)) => stored == presented_hash && expiry >= now,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::memory::MemoryUserStore,
        clock::ManualClock,
        config::JwtConfig,
        email::EmailMessage,
    };
    use async_trait::async_trait;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    };
    use time::OffsetDateTime;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<EmailMessage>>,
        fail: AtomicBool,
    }

    impl RecordingSender {
        fn sent(&self) -> Vec<EmailMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmailSender for RecordingSender {
        async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(message.clone());
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("smtp unavailable");
            }
            Ok(())
        }
    }

    struct Harness {
        service: AuthService,
        store: Arc<MemoryUserStore>,
        sender: Arc<RecordingSender>,
        clock: Arc<ManualClock>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryUserStore::new());
        let sender = Arc::new(RecordingSender::default());
        let clock = Arc::new(ManualClock::new(OffsetDateTime::now_utc()));
        let keys = JwtKeys::from(&JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 15,
            refresh_ttl_days: 7,
        });
        let settings = AuthSettings {
            refresh_ttl: Duration::days(7),
            confirmation_ttl: Duration::hours(24),
            public_base_url: "https://api.example.com/api/auth".into(),
        };
        let service = AuthService::new(
            store.clone(),
            sender.clone(),
            keys,
            settings,
            clock.clone(),
        );
        Harness {
            service,
            store,
            sender,
            clock,
        }
    }

    impl Harness {
        async fn user(&self, email: &str) -> User {
            self.store.find_by_email(email).await.unwrap().unwrap()
        }

        async fn pending_token(&self, email: &str) -> String {
            self.user(email)
                .await
                .email_confirmation_token
                .expect("pending token")
        }

        async fn register_confirmed(&self, email: &str, password: &str) {
            self.service.register(email, password, None).await.unwrap();
            let token = self.pending_token(&normalize_email(email)).await;
            self.service.confirm_email(email, &token).await.unwrap();
        }
    }

    #[test]
    fn email_normalization_and_shape() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("a b@example.com"));
    }

    #[tokio::test]
    async fn register_creates_unconfirmed_user_and_sends_one_link() {
        let h = harness();
        let out = h
            .service
            .register("Alice@Example.com", "Secret123", Some("User"))
            .await
            .unwrap();
        assert_eq!(out.email, "alice@example.com");
        assert!(out.confirmation_sent);

        let user = h.user("alice@example.com").await;
        assert!(!user.is_email_confirmed);
        assert_eq!(user.role, Role::User);
        assert_ne!(user.password_hash, "Secret123");
        let token = user.email_confirmation_token.clone().unwrap();
        assert_eq!(
            user.email_confirmation_token_expires,
            Some(h.clock.now() + Duration::hours(24))
        );

        let sent = h.sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");
        assert!(sent[0].html_body.contains(&format!("token={token}")));
        assert!(sent[0].html_body.contains("email=alice%40example.com"));
    }

    #[tokio::test]
    async fn register_rejects_bad_input() {
        let h = harness();
        let cases = [
            ("not-an-email", "Secret123", None),
            ("a@b.io", "short", None),
            ("a@b.io", "Secret123", Some("Root")),
        ];
        for (email, password, role) in cases {
            let err = h.service.register(email, password, role).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidInput(_)), "{email} {role:?}");
        }
        assert!(h.store.is_empty().await);
        assert!(h.sender.sent().is_empty());
    }

    #[tokio::test]
    async fn register_accepts_admin_role() {
        let h = harness();
        h.service
            .register("root@example.com", "Secret123", Some("Admin"))
            .await
            .unwrap();
        assert_eq!(h.user("root@example.com").await.role, Role::Admin);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts_for_any_variant() {
        let h = harness();
        h.service
            .register("alice@example.com", "Secret123", None)
            .await
            .unwrap();
        for variant in ["alice@example.com", "  ALICE@example.com", "Alice@Example.Com\t"] {
            let err = h
                .service
                .register(variant, "Other1234", None)
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::Conflict), "{variant}");
        }
        assert_eq!(h.store.len().await, 1);
    }

    #[tokio::test]
    async fn register_survives_email_failure() {
        let h = harness();
        h.sender.fail.store(true, Ordering::SeqCst);
        let out = h
            .service
            .register("bob@example.com", "Secret123", None)
            .await
            .unwrap();
        assert!(!out.confirmation_sent);
        assert!(!h.user("bob@example.com").await.is_email_confirmed);
    }

    #[tokio::test]
    async fn confirm_with_issued_token_clears_pair_once() {
        let h = harness();
        h.service
            .register("alice@example.com", "Secret123", None)
            .await
            .unwrap();
        let token = h.pending_token("alice@example.com").await;

        h.service
            .confirm_email("Alice@Example.com", &token)
            .await
            .unwrap();
        let user = h.user("alice@example.com").await;
        assert!(user.is_email_confirmed);
        assert!(user.email_confirmation_token.is_none());
        assert!(user.email_confirmation_token_expires.is_none());

        let err = h
            .service
            .confirm_email("alice@example.com", &token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn confirm_rejects_mismatch_and_unknown_email() {
        let h = harness();
        h.service
            .register("alice@example.com", "Secret123", None)
            .await
            .unwrap();
        let token = h.pending_token("alice@example.com").await;

        let err = h
            .service
            .confirm_email("alice@example.com", "bogus")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
        let err = h
            .service
            .confirm_email("nobody@example.com", &token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
        assert_eq!(h.pending_token("alice@example.com").await, token);
    }

    #[tokio::test]
    async fn confirm_after_a_day_is_expired_and_keeps_state() {
        let h = harness();
        h.service
            .register("alice@example.com", "Secret123", None)
            .await
            .unwrap();
        let before = h.user("alice@example.com").await;
        let token = before.email_confirmation_token.clone().unwrap();

        h.clock.advance(Duration::hours(24) + Duration::seconds(1));
        let err = h
            .service
            .confirm_email("alice@example.com", &token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));

        let after = h.user("alice@example.com").await;
        assert!(!after.is_email_confirmed);
        assert_eq!(after.email_confirmation_token, before.email_confirmation_token);
        assert_eq!(
            after.email_confirmation_token_expires,
            before.email_confirmation_token_expires
        );
    }

    #[tokio::test]
    async fn resend_replaces_token() {
        let h = harness();
        h.service
            .register("alice@example.com", "Secret123", None)
            .await
            .unwrap();
        let old = h.pending_token("alice@example.com").await;

        h.service
            .resend_confirmation("ALICE@example.com")
            .await
            .unwrap();
        let new = h.pending_token("alice@example.com").await;
        assert_ne!(old, new);
        let sent = h.sender.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].html_body.contains(&format!("token={new}")));

        let err = h
            .service
            .confirm_email("alice@example.com", &old)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
        h.service
            .confirm_email("alice@example.com", &new)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn resend_errors() {
        let h = harness();
        let err = h
            .service
            .resend_confirmation("ghost@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound));

        h.register_confirmed("alice@example.com", "Secret123").await;
        let err = h
            .service
            .resend_confirmation("alice@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AlreadyConfirmed));
    }

    #[tokio::test]
    async fn resend_reports_delivery_failure_but_keeps_new_token() {
        let h = harness();
        h.service
            .register("alice@example.com", "Secret123", None)
            .await
            .unwrap();
        let old = h.pending_token("alice@example.com").await;
        h.sender.fail.store(true, Ordering::SeqCst);

        let err = h
            .service
            .resend_confirmation("alice@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DeliveryFailed));
        assert_ne!(h.pending_token("alice@example.com").await, old);
    }

    #[tokio::test]
    async fn login_before_confirmation_is_rejected_even_with_right_password() {
        let h = harness();
        h.service
            .register("Alice@Example.com", "Secret123", Some("User"))
            .await
            .unwrap();
        let err = h
            .service
            .login("alice@example.com", "Secret123")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailNotConfirmed));
        let err = h
            .service
            .login("alice@example.com", "WrongPass1")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailNotConfirmed));

        let token = h.pending_token("alice@example.com").await;
        h.service
            .confirm_email("alice@example.com", &token)
            .await
            .unwrap();
        let pair = h
            .service
            .login("alice@example.com", "Secret123")
            .await
            .unwrap();
        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let h = harness();
        h.register_confirmed("alice@example.com", "Secret123").await;

        let unknown = h
            .service
            .login("nobody@example.com", "Secret123")
            .await
            .unwrap_err();
        let wrong = h
            .service
            .login("alice@example.com", "Wrong-pass")
            .await
            .unwrap_err();
        assert_eq!(unknown.code(), wrong.code());
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(matches!(wrong, AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn login_persists_refresh_token_for_seven_days() {
        let h = harness();
        h.register_confirmed("alice@example.com", "Secret123").await;

        let pair = h
            .service
            .login("  alice@EXAMPLE.com", "Secret123")
            .await
            .unwrap();
        let user = h.user("alice@example.com").await;
        assert_eq!(
            user.refresh_token.as_deref(),
            Some(hash_refresh_token(&pair.refresh_token).as_str())
        );
        assert_eq!(user.refresh_token_expiry, Some(h.clock.now() + Duration::days(7)));

        let claims = h.service.keys().verify(&pair.access_token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.iat, h.clock.now().unix_timestamp() as usize);
    }

    #[tokio::test]
    async fn access_tokens_are_stamped_with_service_clock() {
        let h = harness();
        h.register_confirmed("alice@example.com", "Secret123").await;
        let first = h
            .service
            .login("alice@example.com", "Secret123")
            .await
            .unwrap();

        h.clock.advance(Duration::minutes(10));
        let rotated = h
            .service
            .refresh_token("alice@example.com", &first.refresh_token)
            .await
            .unwrap();
        let claims = h.service.keys().verify(&rotated.access_token).unwrap();
        let now = h.clock.now().unix_timestamp() as usize;
        assert_eq!(claims.iat, now);
        assert_eq!(claims.exp, now + 15 * 60);
    }

    #[tokio::test]
    async fn refresh_rotates_and_stale_token_fails() {
        let h = harness();
        h.register_confirmed("alice@example.com", "Secret123").await;
        let first = h
            .service
            .login("alice@example.com", "Secret123")
            .await
            .unwrap();

        h.clock.advance(Duration::hours(1));
        let second = h
            .service
            .refresh_token("alice@example.com", &first.refresh_token)
            .await
            .unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
        let user = h.user("alice@example.com").await;
        assert_eq!(user.refresh_token_expiry, Some(h.clock.now() + Duration::days(7)));

        let err = h
            .service
            .refresh_token("alice@example.com", &first.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));

        h.service
            .refresh_token("alice@example.com", &second.refresh_token)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn refresh_rejects_unknown_user_and_expired_token() {
        let h = harness();
        h.register_confirmed("alice@example.com", "Secret123").await;
        let pair = h
            .service
            .login("alice@example.com", "Secret123")
            .await
            .unwrap();

        let err = h
            .service
            .refresh_token("bob@example.com", &pair.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));

        h.clock.advance(Duration::days(7) + Duration::seconds(1));
        let err = h
            .service
            .refresh_token("alice@example.com", &pair.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn concurrent_refresh_has_one_winner() {
        let h = Arc::new(harness());
        h.register_confirmed("alice@example.com", "Secret123").await;
        let pair = h
            .service
            .login("alice@example.com", "Secret123")
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let h = h.clone();
            let token = pair.refresh_token.clone();
            handles.push(tokio::spawn(async move {
                h.service.refresh_token("alice@example.com", &token).await
            }));
        }
        let mut winners = Vec::new();
        for handle in handles {
            if let Ok(pair) = handle.await.unwrap() {
                winners.push(pair);
            }
        }
        assert_eq!(winners.len(), 1);
        let user = h.user("alice@example.com").await;
        assert_eq!(
            user.refresh_token.as_deref(),
            Some(hash_refresh_token(&winners[0].refresh_token).as_str())
        );
    }

    #[tokio::test]
    async fn logout_invalidates_refresh_token() {
        let h = harness();
        h.register_confirmed("alice@example.com", "Secret123").await;
        let pair = h
            .service
            .login("alice@example.com", "Secret123")
            .await
            .unwrap();

        h.service.logout("alice@example.com").await.unwrap();
        let user = h.user("alice@example.com").await;
        assert!(user.refresh_token.is_none() && user.refresh_token_expiry.is_none());

        let err = h
            .service
            .refresh_token("alice@example.com", &pair.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));

        // second logout is a no-op
        h.service.logout("alice@example.com").await.unwrap();
        let err = h.service.logout("ghost@example.com").await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound));
    }
}
