use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{auth::jwt::AuthUser, state::AppState};

use super::dto::{total_pages, CreateFeedbackRequest, FeedbackPage, FeedbackQuery};
use super::repo::{self, Feedback};

pub fn feedback_routes() -> Router<AppState> {
    Router::new()
        .route("/feedback", get(list_feedback).post(submit_feedback))
        .route("/feedback/:id", get(get_feedback).delete(delete_feedback))
}

#[instrument(skip(state))]
pub async fn list_feedback(
    State(state): State<AppState>,
    Query(q): Query<FeedbackQuery>,
) -> Result<Json<FeedbackPage>, (StatusCode, String)> {
    let (page_number, page_size) = q.page();
    let (feedbacks, total_items) =
        repo::list(&state.db, q.rating, q.email_filter(), page_size, q.offset())
            .await
            .map_err(internal)?;
    Ok(Json(FeedbackPage {
        total_items,
        total_pages: total_pages(total_items, page_size),
        page_number,
        page_size,
        feedbacks,
    }))
}

#[instrument(skip(state))]
pub async fn get_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Feedback>, (StatusCode, String)> {
    match repo::get(&state.db, id).await.map_err(internal)? {
        Some(fb) => Ok(Json(fb)),
        None => Err((StatusCode::NOT_FOUND, format!("Feedback with ID {id} not found."))),
    }
}

/// POST /feedback, bearer required.
#[instrument(skip(state, claims, body))]
pub async fn submit_feedback(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(body): Json<CreateFeedbackRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Feedback>), (StatusCode, String)> {
    if let Err(msg) = body.validate() {
        warn!(user_id = %claims.sub, %msg, "invalid feedback");
        return Err((StatusCode::BAD_REQUEST, msg));
    }

    let fb = repo::insert(&state.db, body.email.trim(), body.message.trim(), body.rating)
        .await
        .map_err(internal)?;
    info!(user_id = %claims.sub, feedback_id = %fb.id, "feedback submitted");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/feedback/{}", fb.id)) {
        headers.insert(axum::http::header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(fb)))
}

#[instrument(skip(state, claims))]
pub async fn delete_feedback(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if repo::delete(&state.db, id).await.map_err(internal)? {
        info!(user_id = %claims.sub, feedback_id = %id, "feedback deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("Feedback with ID {id} not found.")))
    }
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "feedback store failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
}
