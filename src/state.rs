use sqlx::SqlitePool;

use globalsearch_backend::search::SearchManager;

/// Shared application state / 共享应用状态
pub struct AppState {
    pub db: SqlitePool,
    pub search_manager: SearchManager,
}
