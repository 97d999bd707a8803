use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::{content, progress, query};

use super::AppState;

#[utoipa::path(
    context_path = "/api",
    path = "/current-chapter",
    method(get),
    responses(
        (status = 200, description = "The newest active chapter, or an empty object when none exists", body = content::Chapter),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn current_chapter(State(state): State<AppState>) -> impl IntoResponse {
    match content::current_chapter(&state.database).await {
        Ok(Some(chapter)) => Json(chapter).into_response(),
        Ok(None) => Json(json!({})).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    context_path = "/api",
    path = "/upcoming-test",
    method(get),
    responses(
        (status = 200, description = "The newest active test, or an empty object when none exists", body = content::Test),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn upcoming_test(State(state): State<AppState>) -> impl IntoResponse {
    match content::upcoming_test(&state.database).await {
        Ok(Some(test)) => Json(test).into_response(),
        Ok(None) => Json(json!({})).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    context_path = "/api",
    path = "/previous-chapters",
    method(get),
    responses(
        (status = 200, description = "Active chapters released before now, newest first", body = Vec<content::Chapter>),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn previous_chapters(State(state): State<AppState>) -> impl IntoResponse {
    match content::previous_chapters(&state.database, OffsetDateTime::now_utc()).await {
        Ok(chapters) => Json(chapters).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkCompletedRequest {
    pub chapter_number: i64,
}

#[utoipa::path(
    context_path = "/api",
    path = "/mark-completed",
    method(post),
    request_body = MarkCompletedRequest,
    responses(
        (status = 200, description = "Completion recorded (idempotent)"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn mark_completed(
    State(state): State<AppState>,
    Json(req): Json<MarkCompletedRequest>,
) -> impl IntoResponse {
    match progress::mark_chapter_completed(&state.database, &state.user_id, req.chapter_number)
        .await
    {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    context_path = "/api",
    path = "/user-progress",
    method(get),
    responses(
        (status = 200, description = "Completion summary for the current user", body = query::ProgressSummary),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn user_progress(State(state): State<AppState>) -> impl IntoResponse {
    match query::progress_summary(&state.database, &state.user_id).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => e.into_response(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/current-chapter", get(current_chapter))
        .route("/upcoming-test", get(upcoming_test))
        .route("/previous-chapters", get(previous_chapters))
        .route("/mark-completed", post(mark_completed))
        .route("/user-progress", get(user_progress))
}
