use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    auth::{
        jwt::JwtKeys,
        repo::{PgUserStore, UserStore},
        services::{AuthService, AuthSettings},
    },
    clock::{Clock, SystemClock},
    config::AppConfig,
    email::{sender_from_config, EmailSender},
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let sender = sender_from_config(&config.email)?;
        let store = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;

        Ok(Self::from_parts(db, config, store, sender, Arc::new(SystemClock)))
    }

    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        store: Arc<dyn UserStore>,
        sender: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let auth = Arc::new(AuthService::new(
            store,
            sender,
            JwtKeys::from(&config.jwt),
            AuthSettings::from(config.as_ref()),
            clock,
        ));
        Self { db, config, auth }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.auth.keys().clone()
    }
}
