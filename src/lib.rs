//! User feedback API: feedback records plus email-verified accounts with
//! short-lived access tokens and rotating refresh tokens.

pub mod app;
pub mod auth;
pub mod clock;
pub mod config;
pub mod email;
pub mod feedback;
pub mod state;

pub use state::AppState;
