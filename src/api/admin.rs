use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use crate::content::{self, NewChapter, NewTest};

use super::AppState;

#[utoipa::path(
    context_path = "/api",
    path = "/chapters",
    method(post),
    request_body = NewChapter,
    responses(
        (status = 201, description = "Chapter created", body = content::Chapter),
        (status = 400, description = "Missing or invalid fields"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn create_chapter(
    State(state): State<AppState>,
    Json(req): Json<NewChapter>,
) -> impl IntoResponse {
    match content::create_chapter(&state.database, req).await {
        Ok(chapter) => (StatusCode::CREATED, Json(chapter)).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    context_path = "/api",
    path = "/tests",
    method(post),
    request_body = NewTest,
    responses(
        (status = 201, description = "Test created", body = content::Test),
        (status = 400, description = "Missing or invalid fields"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn create_test(
    State(state): State<AppState>,
    Json(req): Json<NewTest>,
) -> impl IntoResponse {
    match content::create_test(&state.database, req).await {
        Ok(test) => (StatusCode::CREATED, Json(test)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chapters", post(create_chapter))
        .route("/tests", post(create_test))
}
