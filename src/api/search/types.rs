use serde::{Deserialize, Serialize};

use globalsearch_backend::models::ResultItem;

/// 搜索请求
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub per_page: Option<usize>,
    #[serde(default)]
    pub template_type: Option<String>,
}

/// One provider's slice of the aggregated response / 单个提供者的结果
#[derive(Debug, Serialize)]
pub struct TypeResults {
    #[serde(rename = "type")]
    pub search_type: String,
    pub total: i64,
    pub items: Vec<ResultItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 聚合搜索响应
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<TypeResults>,
}

/// 搜索设置（管理端）
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchSettings {
    pub items_to_search: Vec<String>,
}

/// 设置页选项渲染请求
#[derive(Debug, Deserialize)]
pub struct OptionsQuery {
    #[serde(rename = "type", default = "default_search_type")]
    pub search_type: String,
}

fn default_search_type() -> String {
    "members".to_string()
}
