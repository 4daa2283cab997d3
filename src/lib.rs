pub mod config;
pub mod models;
pub mod options;
pub mod profile;
pub mod search;
pub mod templates;

// Provider package (points to project root providers via path attribute) / 搜索提供者模块
#[path = "../providers/mod.rs"]
pub mod providers;

// Register all search providers (call unified registration function from providers module) / 注册所有搜索提供者
pub async fn register_search_providers(manager: &search::SearchManager) -> anyhow::Result<()> {
    providers::register_all(manager).await
}
