//! Persisted options store / 持久化选项存储
//!
//! List-valued options live in the `site_settings` key/value table as JSON
//! arrays. The search settings UI owns writes; providers only read.

use sqlx::SqlitePool;

/// Option key holding the admin's selected search fields / 已选搜索字段选项键
pub const ITEMS_TO_SEARCH: &str = "items-to-search";

/// Read a list-valued option, empty when missing or malformed / 读取列表选项
pub async fn get_list_option(pool: &SqlitePool, key: &str) -> Vec<String> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT value FROM site_settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await
            .ok()
            .flatten();

    match row {
        Some((value,)) => serde_json::from_str(&value).unwrap_or_else(|e| {
            tracing::warn!("Malformed list option {}: {}", key, e);
            Vec::new()
        }),
        None => Vec::new(),
    }
}

/// Replace a list-valued option / 写入列表选项
pub async fn set_list_option(
    pool: &SqlitePool,
    key: &str,
    values: &[String],
) -> Result<(), sqlx::Error> {
    let encoded = serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string());

    sqlx::query(
        r#"
        INSERT INTO site_settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(&encoded)
    .execute(pool)
    .await?;

    Ok(())
}

/// Read a plain string option / 读取字符串选项
pub async fn get_option(pool: &SqlitePool, key: &str) -> Option<String> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT value FROM site_settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await
            .ok()
            .flatten();

    row.map(|(value,)| value)
}
