use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            ConfirmQuery, LoginRequest, PublicUser, RefreshRequest, RegisterRequest, Registered,
            ResendRequest, StatusResponse, TokenPair,
        },
        errors::AuthResult,
        extract::{AuthJson, AuthQuery},
        jwt::AuthUser,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/confirm", get(confirm))
        .route("/auth/resend-confirmation", post(resend_confirmation))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AuthJson(payload): AuthJson<RegisterRequest>,
) -> AuthResult<(StatusCode, Json<Registered>)> {
    let registered = state
        .auth
        .register(&payload.email, &payload.password, payload.role.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(registered)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AuthJson(payload): AuthJson<LoginRequest>,
) -> AuthResult<Json<TokenPair>> {
    let pair = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(pair))
}

/// Target of the emailed link; the query extractor percent-decodes once.
#[instrument(skip(state, query))]
pub async fn confirm(
    State(state): State<AppState>,
    AuthQuery(query): AuthQuery<ConfirmQuery>,
) -> AuthResult<Json<StatusResponse>> {
    state.auth.confirm_email(&query.email, &query.token).await?;
    Ok(Json(StatusResponse {
        status: "email_confirmed",
    }))
}

#[instrument(skip(state, payload))]
pub async fn resend_confirmation(
    State(state): State<AppState>,
    AuthJson(payload): AuthJson<ResendRequest>,
) -> AuthResult<Json<StatusResponse>> {
    state.auth.resend_confirmation(&payload.email).await?;
    Ok(Json(StatusResponse {
        status: "confirmation_sent",
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    AuthJson(payload): AuthJson<RefreshRequest>,
) -> AuthResult<Json<TokenPair>> {
    let pair = state
        .auth
        .refresh_token(&payload.email, &payload.refresh_token)
        .await?;
    Ok(Json(pair))
}

/// Ends the session of the bearer's own account.
#[instrument(skip(state, claims))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> AuthResult<StatusCode> {
    state.auth.logout(&claims.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(claims): AuthUser) -> Json<PublicUser> {
    Json(PublicUser {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    })
}
