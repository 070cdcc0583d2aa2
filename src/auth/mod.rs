use axum::Router;

use crate::state::AppState;

pub mod claims;
pub mod confirmation;
pub mod dto;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod jwt;
pub mod memory;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
