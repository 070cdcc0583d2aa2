use anyhow::{bail, Context};
use serde::Deserialize;

const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Environment::Development,
            _ => Environment::Production,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// HTTP mail relay endpoint; `None` logs messages instead of sending them.
    pub relay_url: Option<String>,
    pub relay_token: Option<String>,
    pub sender: String,
    /// Prefix for confirmation links, e.g. `https://api.example.com/api/auth`.
    pub public_base_url: String,
    pub confirmation_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub email: EmailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::parse(&env_or("APP_ENV", "production"));
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: env_or("JWT_ISSUER", "feedback-api"),
            audience: env_or("JWT_AUDIENCE", "feedback-api-users"),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 15)?,
            refresh_ttl_days: env_parse("REFRESH_TTL_DAYS", 7)?,
        };
        let email = EmailConfig {
            relay_url: std::env::var("EMAIL_RELAY_URL").ok().filter(|v| !v.is_empty()),
            relay_token: std::env::var("EMAIL_RELAY_TOKEN").ok().filter(|v| !v.is_empty()),
            sender: env_or("EMAIL_SENDER", "no-reply@localhost"),
            public_base_url: env_or("PUBLIC_BASE_URL", "http://localhost:8080/api/auth"),
            confirmation_ttl_hours: env_parse("CONFIRMATION_TTL_HOURS", 24)?,
        };

        let config = Self {
            environment,
            database_url,
            jwt,
            email,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that are only tolerable on a developer machine.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt.secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        if self.jwt.ttl_minutes <= 0 || self.jwt.refresh_ttl_days <= 0 {
            bail!("token lifetimes must be positive");
        }
        if self.email.confirmation_ttl_hours <= 0 {
            bail!("CONFIRMATION_TTL_HOURS must be positive");
        }
        if self.environment == Environment::Production {
            if self.jwt.secret.len() < MIN_SECRET_LEN {
                bail!("JWT_SECRET must be at least {MIN_SECRET_LEN} bytes outside development");
            }
            if self.email.relay_url.is_none() {
                bail!("EMAIL_RELAY_URL is required outside development");
            }
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

/// Unset falls back to `default`; a set value must parse.
fn env_parse(key: &str, default: i64) -> anyhow::Result<i64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .with_context(|| format!("{key} must be an integer, got {raw:?}")),
        Err(_) => Ok(default),
    }
}
