use axum::{extract::State, Json};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::state::AppState;
use globalsearch_backend::config;
use globalsearch_backend::options;
use globalsearch_backend::profile;
use globalsearch_backend::search::{
    ProviderContext, SearchError, SearchManager, SearchProvider, SearchResults, SqlFilterContext,
};

use super::types::*;
use crate::api::ApiResponse;

/// POST /api/search - 聚合搜索
///
/// Runs every registered provider: count query for the total, full query for
/// the id page, placeholder seeding, then generate_html to materialize items.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Json<ApiResponse<SearchResponse>> {
    let term = req.query.trim().to_string();
    if term.is_empty() {
        return Json(ApiResponse::error("Search term must not be empty"));
    }

    let app_config = config::config();
    let per_page = req.per_page.unwrap_or(app_config.search.per_page);
    let template_type = req
        .template_type
        .unwrap_or(app_config.search.template_type);

    let ctx = build_provider_context(&state.db).await;

    let mut results = Vec::new();
    for provider in state.search_manager.get_all_providers().await {
        let search_type = provider.search_type().to_string();
        match run_provider(
            &state.db,
            &state.search_manager,
            provider.as_ref(),
            &term,
            per_page,
            &template_type,
            &ctx,
        )
        .await
        {
            Ok(type_results) => results.push(type_results),
            Err(e) => {
                // One provider failing must not abort the others / 单个失败不影响其他
                tracing::error!("Search provider {} failed: {}", search_type, e);
                results.push(TypeResults {
                    search_type,
                    total: 0,
                    items: Vec::new(),
                    error: Some(e.to_string()),
                });
            }
        }
    }

    Json(ApiResponse::success(SearchResponse { results }))
}

/// GET /api/search/types - 列出已注册的搜索类型
pub async fn list_search_types(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<String>>> {
    Json(ApiResponse::success(
        state.search_manager.list_search_types().await,
    ))
}

/// Assemble the per-request provider context (persisted selection + live
/// catalog when the profile component is active) / 组装提供者上下文
pub async fn build_provider_context(db: &SqlitePool) -> ProviderContext {
    let items_to_search = options::get_list_option(db, options::ITEMS_TO_SEARCH).await;

    let profile_groups = if profile::is_active(db).await {
        match profile::get_groups(db).await {
            Ok(groups) => groups,
            Err(e) => {
                tracing::warn!("Failed to load profile field catalog: {}", e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    ProviderContext {
        items_to_search,
        profile_groups,
    }
}

async fn run_provider(
    db: &SqlitePool,
    manager: &SearchManager,
    provider: &dyn SearchProvider,
    term: &str,
    per_page: usize,
    template_type: &str,
    ctx: &ProviderContext,
) -> Result<TypeResults, SearchError> {
    let search_type = provider.search_type();

    // Total first (pagination), then the full id page / 先取总数再取结果页
    let count_query = manager.apply_sql_filters(
        provider.sql(term, true, ctx),
        &SqlFilterContext {
            search_type: search_type.to_string(),
            search_term: term.to_string(),
            only_total_row_count: true,
        },
    );
    let mut count = sqlx::query_scalar::<_, i64>(&count_query.sql);
    for param in &count_query.params {
        count = count.bind(param);
    }
    let total = count.fetch_one(db).await?;

    let full_query = manager.apply_sql_filters(
        provider.sql(term, false, ctx),
        &SqlFilterContext {
            search_type: search_type.to_string(),
            search_term: term.to_string(),
            only_total_row_count: false,
        },
    );
    let mut full = sqlx::query(&full_query.sql);
    for param in &full_query.params {
        full = full.bind(param);
    }
    let rows = full.fetch_all(db).await?;

    // Seed placeholders for the id page, then let the provider materialize
    let mut search_results = SearchResults::new();
    for row in rows.iter().take(per_page) {
        let id: i64 = row.try_get("id")?;
        search_results.insert_placeholder(id, search_type);
    }

    provider
        .generate_html(db, template_type, &mut search_results)
        .await?;

    let mut items: Vec<_> = search_results.items.into_values().collect();
    items.sort_by_key(|item| item.id);

    Ok(TypeResults {
        search_type: search_type.to_string(),
        total,
        items,
        error: None,
    })
}
