//! Global search core / 全局搜索核心
//!
//! Architecture principles / 架构原则：
//! - Providers only expose primitive operations: sql, generate_html, print_search_options
//! - Core (the API layer) controls execution: run count query, run full query,
//!   seed placeholders, materialize HTML
//! - Call direction: Core → Provider (unidirectional) / 调用方向
//!
//! The provider registry is populated once at startup; SQL filters are the
//! explicit form of the original platform's named filter hooks.

pub mod query;

pub use query::{like_pattern, Predicate, QueryBuilder, SqlQuery};

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{ProfileGroup, ResultItem};

/// Search errors surfaced to the API layer / 搜索错误
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("unknown search type: {0}")]
    UnknownSearchType(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Per-request provider inputs: persisted selection + live field catalog
/// 每次请求的提供者上下文：持久化选择 + 实时字段目录
#[derive(Debug, Clone, Default)]
pub struct ProviderContext {
    /// Tokens from the `items-to-search` option / 已选搜索项
    pub items_to_search: Vec<String>,
    /// Live custom profile field catalog; empty when the profile component
    /// is inactive / 实时自定义资料字段目录
    pub profile_groups: Vec<ProfileGroup>,
}

/// Shared results map, keyed by entity id / 共享结果映射
///
/// The aggregator seeds placeholders from the id column of the full query;
/// generate_html replaces entries in place and must not add or remove keys.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub items: HashMap<i64, ResultItem>,
}

impl SearchResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_placeholder(&mut self, id: i64, item_type: &str) {
        self.items.insert(id, ResultItem::placeholder(id, item_type));
    }

    pub fn ids(&self) -> Vec<i64> {
        self.items.keys().copied().collect()
    }
}

/// Context handed to SQL filters alongside the assembled query / 过滤器上下文
#[derive(Debug, Clone)]
pub struct SqlFilterContext {
    pub search_type: String,
    pub search_term: String,
    pub only_total_row_count: bool,
}

/// Callback rewriting a provider's final query; the returned value is
/// authoritative / SQL 过滤回调
pub type SqlFilter = Arc<dyn Fn(SqlQuery, &SqlFilterContext) -> SqlQuery + Send + Sync>;

/// Search provider interface (one per entity kind) / 搜索提供者接口
#[async_trait]
pub trait SearchProvider: Send + Sync + std::fmt::Debug {
    /// Fixed type tag ("members", ...) / 类型标签
    fn search_type(&self) -> &'static str;

    /// Build the parameterized query for this search / 构建查询
    ///
    /// Count mode returns a single COUNT row for pagination totals; full mode
    /// returns distinct entity ids with the relevance flag and recency column.
    fn sql(&self, search_term: &str, only_total_row_count: bool, ctx: &ProviderContext) -> SqlQuery;

    /// Materialize rendered items for the ids already present in `results`
    /// 为结果映射中的 id 生成渲染条目
    async fn generate_html(
        &self,
        db: &SqlitePool,
        template_type: &str,
        results: &mut SearchResults,
    ) -> Result<(), SearchError>;

    /// Render the admin field-selection checkboxes into `out` / 渲染管理选项
    fn print_search_options(&self, out: &mut String, ctx: &ProviderContext);
}

/// Search manager (provider registry + SQL filter registry) / 搜索管理器
#[derive(Clone)]
pub struct SearchManager {
    providers: Arc<RwLock<HashMap<String, Arc<dyn SearchProvider>>>>,
    sql_filters: Arc<parking_lot::RwLock<HashMap<String, Vec<SqlFilter>>>>,
}

impl SearchManager {
    pub fn new() -> Self {
        Self {
            providers: Arc::new(RwLock::new(HashMap::new())),
            sql_filters: Arc::new(parking_lot::RwLock::new(HashMap::new())),
        }
    }

    /// Register a search provider / 注册搜索提供者
    pub async fn register_provider(&self, provider: Arc<dyn SearchProvider>) {
        let search_type = provider.search_type().to_string();
        let mut providers = self.providers.write().await;
        providers.insert(search_type.clone(), provider);

        tracing::info!("Search provider registered: {}", search_type);
    }

    /// Get a provider by type / 获取提供者
    pub async fn get_provider(
        &self,
        search_type: &str,
    ) -> Result<Arc<dyn SearchProvider>, SearchError> {
        let providers = self.providers.read().await;
        providers
            .get(search_type)
            .cloned()
            .ok_or_else(|| SearchError::UnknownSearchType(search_type.to_string()))
    }

    /// List registered search types / 列出已注册搜索类型
    pub async fn list_search_types(&self) -> Vec<String> {
        let providers = self.providers.read().await;
        let mut types: Vec<String> = providers.keys().cloned().collect();
        types.sort();
        types
    }

    /// Get all providers (for aggregation) / 获取所有提供者
    pub async fn get_all_providers(&self) -> Vec<Arc<dyn SearchProvider>> {
        let providers = self.providers.read().await;
        let mut all: Vec<(String, Arc<dyn SearchProvider>)> = providers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all.into_iter().map(|(_, p)| p).collect()
    }

    /// Register a SQL filter for one search type / 注册 SQL 过滤器
    pub fn add_sql_filter(&self, search_type: &str, filter: SqlFilter) {
        let mut filters = self.sql_filters.write();
        filters.entry(search_type.to_string()).or_default().push(filter);

        tracing::debug!("SQL filter registered for search type: {}", search_type);
    }

    /// Run all filters for a type over the assembled query / 应用 SQL 过滤器
    ///
    /// Callers must treat the returned query as final whether or not any
    /// filter is registered.
    pub fn apply_sql_filters(&self, query: SqlQuery, ctx: &SqlFilterContext) -> SqlQuery {
        let filters = self.sql_filters.read();
        match filters.get(&ctx.search_type) {
            Some(chain) => chain.iter().fold(query, |q, f| f(q, ctx)),
            None => query,
        }
    }
}

impl Default for SearchManager {
    fn default() -> Self {
        Self::new()
    }
}
