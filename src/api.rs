pub mod admin;
pub mod public;

use axum::Router;
use sqlx::SqlitePool;

/// Shared handler state. `user_id` is the stand-in identity handed to
/// every progress call until real authentication resolves one per
/// request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub database: SqlitePool,
    pub user_id: String,
}

pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(public::router())
        .merge(admin::router())
}
