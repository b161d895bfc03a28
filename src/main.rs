mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;
mod storage;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, StorageMode};
use crate::db::Database;
use crate::services::gallery::LOCAL_PHOTO_ROUTE;
use crate::storage::StorageManager;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub storage: Arc<StorageManager>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "puploader=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Puploader...");

    // Load configuration
    let config = Config::load()?;
    let config = Arc::new(config);
    tracing::info!("Configuration loaded");

    // Initialize database
    let db = Database::new(&config.database.path).await?;
    db.run_migrations().await?;
    tracing::info!("Database initialized");

    let storage = Arc::new(StorageManager::from_config(&config.storage));

    let state = AppState {
        db,
        config: config.clone(),
        storage,
    };

    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/feed", get(handlers::gallery::get_feed))
        .route("/resources/:kind", post(handlers::resources::reshape_resources));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        // Auth
        .route("/auth/logout", post(handlers::auth::logout))
        // User profile
        .route("/user/profile", get(handlers::user::get_profile))
        // Folders
        .route(
            "/folders",
            get(handlers::photo::list_folders).post(handlers::photo::create_folder),
        )
        // Photos
        .route("/photos/upload", post(handlers::photo::upload_photos))
        .route("/photos/sign", get(handlers::photo::sign_upload))
        // Gallery
        .route("/gallery", get(handlers::gallery::get_gallery))
        .route("/gallery/:subfolder", get(handlers::gallery::get_subfolder_gallery))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    let mut router = Router::new().nest("/api/v1", public_routes.merge(protected_routes));

    // Bucket photos are fetched from the bucket itself
    if state.config.storage.mode == StorageMode::Local {
        router = router.nest_service(
            LOCAL_PHOTO_ROUTE,
            ServeDir::new(&state.config.storage.local_path),
        );
    }

    router
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
