//! Custom profile field catalog / 自定义资料字段目录
//!
//! Group → field hierarchy owned by the profile subsystem; fetched live on
//! every options render and query build, never cached here.

use sqlx::SqlitePool;

use crate::models::{ProfileField, ProfileGroup, ProfileGroupRow};

/// Whether the custom profile component is active / 资料组件是否启用
pub async fn is_active(pool: &SqlitePool) -> bool {
    crate::options::get_option(pool, "profile_component_active")
        .await
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Fetch the live group → field catalog, fields attached / 获取实时目录
pub async fn get_groups(pool: &SqlitePool) -> Result<Vec<ProfileGroup>, sqlx::Error> {
    let group_rows: Vec<ProfileGroupRow> = sqlx::query_as(
        "SELECT id, name, group_order FROM profile_groups ORDER BY group_order, id",
    )
    .fetch_all(pool)
    .await?;

    let field_rows: Vec<ProfileField> = sqlx::query_as(
        "SELECT id, group_id, name, field_order FROM profile_fields ORDER BY field_order, id",
    )
    .fetch_all(pool)
    .await?;

    let groups = group_rows
        .into_iter()
        .map(|group| {
            let fields = field_rows
                .iter()
                .filter(|f| f.group_id == group.id)
                .cloned()
                .collect();
            ProfileGroup {
                id: group.id,
                name: group.name,
                fields,
            }
        })
        .collect();

    Ok(groups)
}
