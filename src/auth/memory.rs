use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::auth::{
    repo::UserStore,
    repo_types::{NewUser, User},
};

/// Process-local `UserStore`. One mutex guards the whole map, so every
/// compare-and-swap below is atomic with respect to the others.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.lock().await.is_empty()
    }
}

fn by_id(users: &mut HashMap<String, User>, id: Uuid) -> Option<&mut User> {
    users.values_mut().find(|u| u.id == id)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.users.lock().await.get(email).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool> {
        Ok(self.users.lock().await.contains_key(email))
    }

    async fn insert(&self, user: NewUser) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user.email) {
            return Ok(None);
        }
        let user = User::from(user);
        users.insert(user.email.clone(), user.clone());
        Ok(Some(user))
    }

    async fn confirm_email(
        &self,
        id: Uuid,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let mut users = self.users.lock().await;
        let Some(user) = by_id(&mut users, id) else {
            return Ok(false);
        };
        let live = user.email_confirmation_token.as_deref() == Some(token)
            && user
                .email_confirmation_token_expires
                .is_some_and(|exp| exp >= now);
        if !live {
            return Ok(false);
        }
        user.is_email_confirmed = true;
        user.email_confirmation_token = None;
        user.email_confirmation_token_expires = None;
        Ok(true)
    }

    async fn replace_confirmation(
        &self,
        id: Uuid,
        token: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let mut users = self.users.lock().await;
        match by_id(&mut users, id) {
            Some(user) if !user.is_email_confirmed => {
                user.email_confirmation_token = Some(token.to_string());
                user.email_confirmation_token_expires = Some(expires);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_refresh_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expiry: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let mut users = self.users.lock().await;
        if let Some(user) = by_id(&mut users, id) {
            user.refresh_token = Some(token_hash.to_string());
            user.refresh_token_expiry = Some(expiry);
        }
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
        let mut users = self.users.lock().await;
        let Some(user) = by_id(&mut users, id) else {
            return Ok(false);
        };
        let live = user.refresh_token.as_deref() == Some(old_hash)
            && user.refresh_token_expiry.is_some_and(|exp| exp >= now);
        if !live {
            return Ok(false);
        }
        user.refresh_token = Some(new_hash.to_string());
        user.refresh_token_expiry = Some(expiry);
        Ok(true)
    }

    async fn clear_refresh_token(&self, id: Uuid) -> anyhow::Result<()> {
        let mut users = self.users.lock().await;
        if let Some(user) = by_id(&mut users, id) {
            user.refresh_token = None;
            user.refresh_token_expiry = None;
        }
        Ok(())
    }
}
