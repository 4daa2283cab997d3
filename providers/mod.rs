// Provider package / 搜索提供者包
pub mod members;

use std::sync::Arc;

use crate::search::SearchManager;

/// Register all search providers to SearchManager / 注册所有搜索提供者
pub async fn register_all(manager: &SearchManager) -> anyhow::Result<()> {
    // Members provider (accounts + custom profile fields) / 成员搜索提供者
    manager
        .register_provider(Arc::new(members::MembersSearch::new()))
        .await;
    Ok(())
}
