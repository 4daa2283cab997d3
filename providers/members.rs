//! Members search provider / 成员搜索提供者
//!
//! Searches user accounts by native columns (login, display name, email) and
//! admin-selected custom profile fields. The query joins the last-activity
//! log to carry a recency column; accounts without a recorded last activity
//! never match.
//!
//! TODO: custom profile field values marked private by their owner are still
//! searched; field-level privacy needs a visibility column on profile_data.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::models::{ProfileGroup, ResultItem};
use crate::search::{
    like_pattern, Predicate, ProviderContext, QueryBuilder, SearchError, SearchProvider,
    SearchResults, SqlQuery,
};
use crate::templates;

/// Token prefix for native account columns / 原生账号列前缀
pub const MEMBER_FIELD_PREFIX: &str = "member_field_";
/// Token prefix for custom profile field ids / 自定义资料字段前缀
pub const XPROFILE_FIELD_PREFIX: &str = "xprofile_field_";

/// The three native account fields offered in the settings panel / 原生字段
pub const NATIVE_FIELDS: [(&str, &str); 3] = [
    ("user_login", "Username/Login"),
    ("display_name", "Display Name"),
    ("user_email", "Email"),
];

const TYPE_MEMBERS: &str = "members";

/// Members search provider / 成员搜索提供者
#[derive(Debug)]
pub struct MembersSearch;

impl MembersSearch {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MembersSearch {
    fn default() -> Self {
        Self::new()
    }
}

/// Columns selected through `member_field_*` tokens, as persisted (unknown
/// column names fail at the database layer, not here) / 已选原生列
fn selected_native_columns(items_to_search: &[String]) -> Vec<String> {
    items_to_search
        .iter()
        .filter_map(|item| item.strip_prefix(MEMBER_FIELD_PREFIX))
        .map(|column| column.to_string())
        .collect()
}

/// Field ids selected through `xprofile_field_*` tokens, intersected with the
/// live catalog so deleted fields drop out of the query / 已选资料字段
fn selected_profile_field_ids(
    items_to_search: &[String],
    profile_groups: &[ProfileGroup],
) -> Vec<i64> {
    let mut selected = Vec::new();
    for group in profile_groups {
        for field in &group.fields {
            let token = format!("{}{}", XPROFILE_FIELD_PREFIX, field.id);
            if items_to_search.contains(&token) {
                selected.push(field.id);
            }
        }
    }
    selected
}

/// Account row for the member loop / 成员循环行
#[derive(Debug, Clone, sqlx::FromRow)]
struct MemberLoopRow {
    id: i64,
    user_login: String,
    display_name: String,
    last_active: Option<String>,
}

/// Fetch accounts for an id list, page size bounded / 按 id 列表取账号
async fn fetch_members(
    db: &SqlitePool,
    ids: &[i64],
    per_page: usize,
) -> Result<Vec<MemberLoopRow>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; ids.len()].join(",");
    let sql = format!(
        "SELECT u.id, u.user_login, u.display_name, a.date_recorded AS last_active \
         FROM users u \
         LEFT JOIN last_activity a ON a.user_id = u.id \
           AND a.component = 'members' AND a.type = 'last_activity' \
         WHERE u.id IN ({}) LIMIT ?",
        placeholders
    );

    let mut query = sqlx::query_as::<_, MemberLoopRow>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    query = query.bind(per_page as i64);

    query.fetch_all(db).await
}

#[async_trait]
impl SearchProvider for MembersSearch {
    fn search_type(&self) -> &'static str {
        TYPE_MEMBERS
    }

    fn sql(&self, search_term: &str, only_total_row_count: bool, ctx: &ProviderContext) -> SqlQuery {
        let mut builder = QueryBuilder::new("users u JOIN last_activity a ON a.user_id = u.id");

        if only_total_row_count {
            builder = builder.select("COUNT( DISTINCT u.id )");
        } else {
            builder = builder
                .select("DISTINCT u.id")
                .select("'members' AS type")
                .select_param(
                    "u.display_name LIKE ? AS relevance",
                    like_pattern(search_term),
                )
                .select("a.date_recorded AS entry_date");
        }

        // Anchor predicate / 锚定条件
        builder = builder.filter(Predicate::raw("1=1"));

        let mut field_block: Vec<Predicate> = Vec::new();

        let native_columns = selected_native_columns(&ctx.items_to_search);
        if !native_columns.is_empty() {
            let likes = native_columns
                .iter()
                .map(|column| Predicate::like(column, like_pattern(search_term)))
                .collect();
            field_block.push(Predicate::in_select(
                "u.id",
                "id",
                "users",
                Predicate::AnyOf(likes),
            ));
        }

        let field_ids = selected_profile_field_ids(&ctx.items_to_search, &ctx.profile_groups);
        if !field_ids.is_empty() {
            let id_list = field_ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",");
            field_block.push(Predicate::in_select(
                "u.id",
                "user_id",
                "profile_data",
                Predicate::AllOf(vec![
                    Predicate::like("value", like_pattern(search_term)),
                    Predicate::raw(format!("field_id IN ( {} )", id_list)),
                ]),
            ));
        }

        // Field block is optional; with nothing selected the query degenerates
        // to "all accounts with a last-activity row" / 字段块可选
        if !field_block.is_empty() {
            builder = builder.filter(Predicate::AnyOf(field_block));
        }

        // Fixed join-type predicates / 固定连接条件
        builder = builder
            .filter(Predicate::raw("a.component = 'members'"))
            .filter(Predicate::raw("a.type = 'last_activity'"));

        // The activity join is one-to-many, full mode collapses per account
        if !only_total_row_count {
            builder = builder.group_by("u.id");
        }

        builder.build()
    }

    async fn generate_html(
        &self,
        db: &SqlitePool,
        template_type: &str,
        results: &mut SearchResults,
    ) -> Result<(), SearchError> {
        let ids = results.ids();
        if ids.is_empty() {
            return Ok(());
        }

        let members = fetch_members(db, &ids, ids.len()).await?;

        for member in members {
            // Replace placeholders in place only; never introduce new keys
            if let Some(entry) = results.items.get_mut(&member.id) {
                let id_text = member.id.to_string();
                let last_active = member.last_active.clone().unwrap_or_default();
                let html = templates::buffer_template_part(
                    "loop/member",
                    template_type,
                    &[
                        ("id", id_text.as_str()),
                        ("login", member.user_login.as_str()),
                        ("title", member.display_name.as_str()),
                        ("last_active", last_active.as_str()),
                    ],
                );

                *entry = ResultItem {
                    id: member.id,
                    item_type: TYPE_MEMBERS.to_string(),
                    title: member.display_name.clone(),
                    html,
                };
            }
        }

        Ok(())
    }

    fn print_search_options(&self, out: &mut String, ctx: &ProviderContext) {
        out.push_str("<div class='member-native-fields'>\n");
        out.push_str("<p class='field-group-name'><strong>Account</strong></p>\n");

        for (column, label) in NATIVE_FIELDS {
            let token = format!("{}{}", MEMBER_FIELD_PREFIX, column);
            let checked = if ctx.items_to_search.contains(&token) {
                " checked"
            } else {
                ""
            };
            out.push_str(&format!(
                "<label><input type='checkbox' name='items-to-search' value='{}'{}>{}</label><br>\n",
                token, checked, label
            ));
        }

        out.push_str("</div><!-- .member-native-fields -->\n");

        // Custom profile section only when the component is active (the
        // aggregator passes an empty catalog otherwise) / 资料组件未启用则跳过
        if ctx.profile_groups.is_empty() {
            return;
        }

        out.push_str("<div class='xprofile-fields'>\n");
        for group in &ctx.profile_groups {
            out.push_str(&format!(
                "<p class='field-group-name'><strong>{}</strong></p>\n",
                html_escape::encode_text(&group.name)
            ));

            for field in &group.fields {
                let token = format!("{}{}", XPROFILE_FIELD_PREFIX, field.id);
                let checked = if ctx.items_to_search.contains(&token) {
                    " checked"
                } else {
                    ""
                };
                out.push_str(&format!(
                    "<label><input type='checkbox' name='items-to-search' value='{}'{}>{}</label><br>\n",
                    token,
                    checked,
                    html_escape::encode_text(&field.name)
                ));
            }
        }
        out.push_str("</div><!-- .xprofile-fields -->\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileField;

    fn catalog() -> Vec<ProfileGroup> {
        vec![
            ProfileGroup {
                id: 1,
                name: "Base".to_string(),
                fields: vec![
                    ProfileField {
                        id: 3,
                        group_id: 1,
                        name: "Location".to_string(),
                        field_order: 0,
                    },
                    ProfileField {
                        id: 4,
                        group_id: 1,
                        name: "Bio".to_string(),
                        field_order: 1,
                    },
                ],
            },
            ProfileGroup {
                id: 2,
                name: "Work".to_string(),
                fields: vec![ProfileField {
                    id: 7,
                    group_id: 2,
                    name: "Company".to_string(),
                    field_order: 0,
                }],
            },
        ]
    }

    fn ctx(items: &[&str], with_catalog: bool) -> ProviderContext {
        ProviderContext {
            items_to_search: items.iter().map(|s| s.to_string()).collect(),
            profile_groups: if with_catalog { catalog() } else { Vec::new() },
        }
    }

    #[test]
    fn test_native_email_only() {
        let provider = MembersSearch::new();
        let q = provider.sql("joe", false, &ctx(&["member_field_user_email"], false));

        assert!(!q.sql.contains("profile_data"));
        assert_eq!(q.sql.matches("user_email LIKE ?").count(), 1);
        assert!(q
            .sql
            .contains("u.id IN ( SELECT id FROM users WHERE user_email LIKE ? )"));
        // Relevance param first, then the one field param / 相关性参数在前
        assert_eq!(q.params, vec!["%joe%".to_string(), "%joe%".to_string()]);
    }

    #[test]
    fn test_zero_fields_degenerates_to_activity_scan() {
        let provider = MembersSearch::new();
        let q = provider.sql("joe", false, &ctx(&[], false));

        assert!(!q.sql.contains("IN ( SELECT"));
        assert!(q.sql.contains(
            "WHERE 1=1 AND a.component = 'members' AND a.type = 'last_activity'"
        ));
    }

    #[test]
    fn test_count_mode_never_groups() {
        let provider = MembersSearch::new();
        let context = ctx(&["member_field_user_login"], false);

        let count = provider.sql("joe", true, &context);
        assert!(count.sql.starts_with("SELECT COUNT( DISTINCT u.id )"));
        assert!(!count.sql.contains("GROUP BY"));
        assert!(!count.sql.contains("relevance"));
        assert_eq!(count.params, vec!["%joe%".to_string()]);

        let full = provider.sql("joe", false, &context);
        assert!(full.sql.ends_with(" GROUP BY u.id"));
        assert!(full.sql.contains("'members' AS type"));
        assert!(full.sql.contains("a.date_recorded AS entry_date"));
    }

    #[test]
    fn test_native_and_custom_form_single_or_block() {
        let provider = MembersSearch::new();
        let q = provider.sql(
            "joe",
            false,
            &ctx(&["member_field_user_login", "xprofile_field_3"], true),
        );

        assert!(q.sql.contains(
            "( u.id IN ( SELECT id FROM users WHERE user_login LIKE ? ) \
             OR u.id IN ( SELECT user_id FROM profile_data \
             WHERE ( value LIKE ? AND field_id IN ( 3 ) ) ) )"
        ));
    }

    #[test]
    fn test_stale_profile_field_dropped_against_catalog() {
        let provider = MembersSearch::new();
        // Field 99 is persisted but no longer in the live catalog / 目录中已删除
        let q = provider.sql("joe", false, &ctx(&["xprofile_field_99"], true));

        assert!(!q.sql.contains("profile_data"));
        assert!(!q.sql.contains("99"));
    }

    #[test]
    fn test_multiple_profile_fields_inline_id_list() {
        let provider = MembersSearch::new();
        let q = provider.sql(
            "joe",
            false,
            &ctx(&["xprofile_field_3", "xprofile_field_7"], true),
        );

        assert!(q.sql.contains("field_id IN ( 3,7 )"));
        // One value param + relevance param / 值参数与相关性参数各一
        assert_eq!(q.params.len(), 2);
    }

    #[test]
    fn test_options_checked_state() {
        let provider = MembersSearch::new();
        let mut out = String::new();
        provider.print_search_options(&mut out, &ctx(&["member_field_user_email"], false));

        assert!(out.contains("value='member_field_user_email' checked"));
        assert!(out.contains("value='member_field_user_login'>"));
        assert!(out.contains("value='member_field_display_name'>"));
        assert!(!out.contains("xprofile-fields"));
    }

    #[test]
    fn test_options_render_profile_catalog() {
        let provider = MembersSearch::new();
        let mut out = String::new();
        provider.print_search_options(&mut out, &ctx(&["xprofile_field_7"], true));

        assert!(out.contains("<strong>Base</strong>"));
        assert!(out.contains("<strong>Work</strong>"));
        assert!(out.contains("value='xprofile_field_3'>"));
        assert!(out.contains("value='xprofile_field_7' checked"));
    }

    /// Tokens harvested from rendered checkbox values must reproduce the same
    /// predicates as a hand-built selection / 勾选值回写后谓词一致
    #[test]
    fn test_option_tokens_round_trip_into_sql() {
        let provider = MembersSearch::new();
        let mut out = String::new();
        provider.print_search_options(&mut out, &ctx(&[], true));

        let mut harvested = Vec::new();
        for part in out.split("value='").skip(1) {
            if let Some(end) = part.find('\'') {
                harvested.push(part[..end].to_string());
            }
        }
        assert_eq!(harvested.len(), 6); // 3 native + 3 profile fields

        let from_tokens = ProviderContext {
            items_to_search: harvested,
            profile_groups: catalog(),
        };
        let by_hand = ctx(
            &[
                "member_field_user_login",
                "member_field_display_name",
                "member_field_user_email",
                "xprofile_field_3",
                "xprofile_field_4",
                "xprofile_field_7",
            ],
            true,
        );

        let a = provider.sql("joe", false, &from_tokens);
        let b = provider.sql("joe", false, &by_hand);
        assert_eq!(a.sql, b.sql);
        assert_eq!(a.params, b.params);
    }

    async fn loop_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, user_login TEXT NOT NULL, \
             display_name TEXT NOT NULL, user_email TEXT, created_at TEXT NOT NULL DEFAULT '')",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE last_activity (id INTEGER PRIMARY KEY, user_id INTEGER NOT NULL, \
             component TEXT NOT NULL, type TEXT NOT NULL, date_recorded TEXT NOT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO users (id, user_login, display_name, user_email) VALUES \
             (5, 'joe', 'Joe Example', 'joe@example.org'), \
             (9, 'ann', 'Ann Other', 'ann@example.org')",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO last_activity (user_id, component, type, date_recorded) VALUES \
             (5, 'members', 'last_activity', '2024-01-01 10:00:00'), \
             (9, 'members', 'last_activity', '2024-01-02 10:00:00')",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_generate_html_replaces_placeholders_in_place() {
        let pool = loop_pool().await;
        let provider = MembersSearch::new();

        let mut results = SearchResults::new();
        results.insert_placeholder(5, "members");
        results.insert_placeholder(9, "members");

        provider.generate_html(&pool, "", &mut results).await.unwrap();

        assert_eq!(results.items.len(), 2);
        for id in [5i64, 9] {
            let item = &results.items[&id];
            assert_eq!(item.id, id);
            assert_eq!(item.item_type, "members");
            assert!(!item.title.is_empty());
            assert!(item.html.contains(&item.title));
        }
        assert_eq!(results.items[&5].title, "Joe Example");
        assert_eq!(results.items[&9].title, "Ann Other");
    }

    #[tokio::test]
    async fn test_generate_html_ignores_unknown_ids() {
        let pool = loop_pool().await;
        let provider = MembersSearch::new();

        // 42 has no account row; its placeholder must survive untouched
        let mut results = SearchResults::new();
        results.insert_placeholder(5, "members");
        results.insert_placeholder(42, "members");

        provider.generate_html(&pool, "", &mut results).await.unwrap();

        assert_eq!(results.items.len(), 2);
        assert!(!results.items[&5].html.is_empty());
        assert!(results.items[&42].html.is_empty());
    }
}
