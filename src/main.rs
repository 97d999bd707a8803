use std::path::PathBuf;

use axum::Router;
use clap::Parser;
use course_server::{api, store, utils::init_log};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the course database file
    #[arg(short, long, default_value = "database/course.db")]
    database: PathBuf,
    /// Directory with the front-end page and assets
    #[arg(short, long, default_value = "static")]
    assets: PathBuf,
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    #[arg(short, long, default_value = "3000")]
    port: u16,
    /// Stand-in user identity until real authentication exists
    #[arg(short, long, default_value = "demo-user")]
    user: String,
    /// Log directory (stdout when omitted)
    #[arg(short, long)]
    log: Option<PathBuf>,
}

#[derive(OpenApi)]
#[openapi(paths(
    course_server::api::public::current_chapter,
    course_server::api::public::upcoming_test,
    course_server::api::public::previous_chapters,
    course_server::api::public::mark_completed,
    course_server::api::public::user_progress,
    course_server::api::admin::create_chapter,
    course_server::api::admin::create_test,
))]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = init_log(args.log.clone());

    if let Some(dir) = args.database.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)?;
    }
    let database = store::connect(&args.database).await?;
    store::run_migrations(&database).await?;

    let state = api::AppState {
        database,
        user_id: args.user,
    };
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api::api_router())
        .fallback_service(ServeDir::new(&args.assets))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await?;
    info!("serving on http://{}", listener.local_addr()?);
    info!(
        "swagger ui available at http://{}/swagger-ui",
        listener.local_addr()?
    );
    axum::serve(listener, app).await?;
    Ok(())
}
