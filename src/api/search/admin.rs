use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use std::sync::Arc;

use crate::state::AppState;
use globalsearch_backend::options;

use super::query::build_provider_context;
use super::types::*;
use crate::api::ApiResponse;

/// GET /api/admin/search/settings - 获取搜索设置
pub async fn get_search_settings(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<SearchSettings>> {
    let items_to_search = options::get_list_option(&state.db, options::ITEMS_TO_SEARCH).await;
    Json(ApiResponse::success(SearchSettings { items_to_search }))
}

/// POST /api/admin/search/settings - 保存搜索设置
pub async fn update_search_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<SearchSettings>,
) -> Json<ApiResponse<SearchSettings>> {
    match options::set_list_option(&state.db, options::ITEMS_TO_SEARCH, &settings.items_to_search)
        .await
    {
        Ok(()) => {
            tracing::info!(
                "Search settings saved: {} items selected",
                settings.items_to_search.len()
            );
            Json(ApiResponse::success(settings))
        }
        Err(e) => {
            tracing::error!("Failed to save search settings: {}", e);
            Json(ApiResponse::error(&format!("Failed to save settings: {}", e)))
        }
    }
}

/// GET /api/admin/search/options?type=members - 渲染字段选择复选框
///
/// Dispatches to the provider through the registry; the provider writes its
/// checkbox HTML into the buffer and the buffer becomes the response body.
pub async fn get_search_options(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OptionsQuery>,
) -> Result<Html<String>, Json<ApiResponse<()>>> {
    let provider = state
        .search_manager
        .get_provider(&query.search_type)
        .await
        .map_err(|e| Json(ApiResponse::error(&e.to_string())))?;

    let ctx = build_provider_context(&state.db).await;

    let mut out = String::new();
    provider.print_search_options(&mut out, &ctx);

    Ok(Html(out))
}
