use anyhow::Result;
use sqlx::SqlitePool;

use globalsearch_backend::options;

/// Run database migrations / 运行数据库迁移
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_login TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            user_email TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS last_activity (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            component TEXT NOT NULL,
            type TEXT NOT NULL,
            date_recorded TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_last_activity_user \
         ON last_activity(user_id, component, type)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profile_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            group_order INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profile_fields (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            field_order INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (group_id) REFERENCES profile_groups(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profile_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            field_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            value TEXT NOT NULL,
            FOREIGN KEY (field_id) REFERENCES profile_fields(id) ON DELETE CASCADE,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_profile_data_field \
         ON profile_data(field_id, user_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS site_settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    seed_defaults(pool).await?;

    Ok(())
}

/// Seed default settings on first run / 首次运行时写入默认设置
async fn seed_defaults(pool: &SqlitePool) -> Result<()> {
    let existing: Option<(String,)> =
        sqlx::query_as("SELECT value FROM site_settings WHERE key = ?")
            .bind(options::ITEMS_TO_SEARCH)
            .fetch_optional(pool)
            .await?;

    if existing.is_none() {
        // All three native account fields searchable by default / 默认搜索全部原生字段
        let defaults = vec![
            "member_field_user_login".to_string(),
            "member_field_display_name".to_string(),
            "member_field_user_email".to_string(),
        ];
        options::set_list_option(pool, options::ITEMS_TO_SEARCH, &defaults).await?;
        tracing::info!("Seeded default items-to-search option");
    }

    sqlx::query(
        "INSERT INTO site_settings (key, value) VALUES ('profile_component_active', '1') \
         ON CONFLICT(key) DO NOTHING",
    )
    .execute(pool)
    .await?;

    Ok(())
}
