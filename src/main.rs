use axum::{
    routing::{get, post},
    Router,
};
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod db;
mod state;

use globalsearch_backend::config;
use globalsearch_backend::search::SearchManager;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "globalsearch_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config().expect("Failed to load configuration");
    tracing::info!(
        "Server will listen on {}:{}",
        app_config.server.host,
        app_config.server.port
    );

    // Create data directory if not exists / 创建数据目录
    let data_dir = app_config.get_data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory: {:?}", data_dir);
    }

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| app_config.get_database_url());

    let pool = SqlitePool::connect(&database_url).await?;

    db::run_migrations(&pool).await?;

    // Register all search providers / 注册所有搜索提供者
    let search_manager = SearchManager::new();
    globalsearch_backend::register_search_providers(&search_manager).await?;
    tracing::info!(
        "Search providers ready: {:?}",
        search_manager.list_search_types().await
    );

    let state = Arc::new(AppState {
        db: pool,
        search_manager,
    });

    let app = Router::new()
        .route("/api/health", get(api::server::health_check))
        .route("/api/search", post(api::search::search))
        .route("/api/search/types", get(api::search::list_search_types))
        // 搜索管理API
        .route(
            "/api/admin/search/settings",
            get(api::search::get_search_settings),
        )
        .route(
            "/api/admin/search/settings",
            post(api::search::update_search_settings),
        )
        .route(
            "/api/admin/search/options",
            get(api::search::get_search_options),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
