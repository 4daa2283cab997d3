use serde::{Deserialize, Serialize};

/// One rendered search result, keyed by account id in the shared results map / 单条搜索结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub item_type: String,
    pub title: String,
    pub html: String,
}

impl ResultItem {
    /// Placeholder entry, replaced once generate_html has run / 占位条目
    pub fn placeholder(id: i64, item_type: &str) -> Self {
        Self {
            id,
            item_type: item_type.to_string(),
            title: String::new(),
            html: String::new(),
        }
    }
}

/// Custom profile field group / 自定义资料字段分组
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProfileGroupRow {
    pub id: i64,
    pub name: String,
    pub group_order: i64,
}

/// Custom profile field / 自定义资料字段
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProfileField {
    pub id: i64,
    pub group_id: i64,
    pub name: String,
    pub field_order: i64,
}

/// Group with its fields attached (live catalog shape) / 分组及其字段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileGroup {
    pub id: i64,
    pub name: String,
    pub fields: Vec<ProfileField>,
}
