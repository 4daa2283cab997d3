//! Structured query builder / 结构化查询构建器
//!
//! Providers assemble a predicate tree (anchor, optional OR groups, fixed
//! join predicates) instead of concatenating SQL by hand; rendering emits a
//! single parameterized statement with `?` placeholders plus the parallel
//! parameter list, ready for sqlx bind loops.

use serde::{Deserialize, Serialize};

/// Rendered query: SQL text + positional parameters / 渲染结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<String>,
}

/// Wrap a term for contains-matching / 包含匹配通配
pub fn like_pattern(term: &str) -> String {
    format!("%{}%", term)
}

/// One node of the WHERE tree / WHERE 树节点
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Verbatim SQL fragment, no parameters / 原样 SQL 片段
    Raw(String),
    /// `column LIKE ?`, parameter supplied pre-wrapped / LIKE 匹配
    Like { column: String, pattern: String },
    /// OR-combined group; single child renders without parens / OR 组合
    AnyOf(Vec<Predicate>),
    /// AND-combined group / AND 组合
    AllOf(Vec<Predicate>),
    /// `column IN ( SELECT select_column FROM from WHERE ... )` / 子查询
    InSelect {
        column: String,
        select_column: String,
        from: String,
        predicate: Box<Predicate>,
    },
}

impl Predicate {
    pub fn raw(sql: impl Into<String>) -> Self {
        Predicate::Raw(sql.into())
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Predicate::Like {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    pub fn in_select(
        column: impl Into<String>,
        select_column: impl Into<String>,
        from: impl Into<String>,
        predicate: Predicate,
    ) -> Self {
        Predicate::InSelect {
            column: column.into(),
            select_column: select_column.into(),
            from: from.into(),
            predicate: Box::new(predicate),
        }
    }

    fn render(&self, sql: &mut String, params: &mut Vec<String>) {
        match self {
            Predicate::Raw(text) => sql.push_str(text),
            Predicate::Like { column, pattern } => {
                sql.push_str(column);
                sql.push_str(" LIKE ?");
                params.push(pattern.clone());
            }
            Predicate::AnyOf(children) => render_group(children, " OR ", sql, params),
            Predicate::AllOf(children) => render_group(children, " AND ", sql, params),
            Predicate::InSelect {
                column,
                select_column,
                from,
                predicate,
            } => {
                sql.push_str(column);
                sql.push_str(" IN ( SELECT ");
                sql.push_str(select_column);
                sql.push_str(" FROM ");
                sql.push_str(from);
                sql.push_str(" WHERE ");
                predicate.render(sql, params);
                sql.push_str(" )");
            }
        }
    }
}

fn render_group(children: &[Predicate], sep: &str, sql: &mut String, params: &mut Vec<String>) {
    // Single-child groups collapse to the child itself / 单元素组不加括号
    if children.len() == 1 {
        children[0].render(sql, params);
        return;
    }
    sql.push_str("( ");
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            sql.push_str(sep);
        }
        child.render(sql, params);
    }
    sql.push_str(" )");
}

/// SELECT/FROM/WHERE/GROUP BY assembler / 查询组装器
///
/// Select parameters come before WHERE parameters in the rendered list,
/// matching the left-to-right position of their placeholders.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    select: Vec<String>,
    select_params: Vec<String>,
    from: String,
    predicates: Vec<Predicate>,
    group_by: Option<String>,
}

impl QueryBuilder {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            ..Default::default()
        }
    }

    /// Add a select expression without parameters / 添加无参数选择列
    pub fn select(mut self, expr: impl Into<String>) -> Self {
        self.select.push(expr.into());
        self
    }

    /// Add a select expression carrying one `?` placeholder / 添加带参数选择列
    pub fn select_param(mut self, expr: impl Into<String>, param: impl Into<String>) -> Self {
        self.select.push(expr.into());
        self.select_params.push(param.into());
        self
    }

    /// Append a top-level WHERE predicate (AND-combined) / 追加顶层条件
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn group_by(mut self, expr: impl Into<String>) -> Self {
        self.group_by = Some(expr.into());
        self
    }

    pub fn build(self) -> SqlQuery {
        let mut sql = String::from("SELECT ");
        sql.push_str(&self.select.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(&self.from);

        let mut params = self.select_params;

        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            for (i, predicate) in self.predicates.iter().enumerate() {
                if i > 0 {
                    sql.push_str(" AND ");
                }
                predicate.render(&mut sql, &mut params);
            }
        }

        if let Some(group_by) = self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(&group_by);
        }

        SqlQuery { sql, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_and_like() {
        let q = QueryBuilder::new("users u")
            .select("u.id")
            .filter(Predicate::raw("1=1"))
            .filter(Predicate::like("u.user_email", like_pattern("joe")))
            .build();

        assert_eq!(
            q.sql,
            "SELECT u.id FROM users u WHERE 1=1 AND u.user_email LIKE ?"
        );
        assert_eq!(q.params, vec!["%joe%".to_string()]);
    }

    #[test]
    fn test_any_of_grouping() {
        let q = QueryBuilder::new("users")
            .select("id")
            .filter(Predicate::AnyOf(vec![
                Predicate::like("user_login", like_pattern("a")),
                Predicate::like("display_name", like_pattern("a")),
            ]))
            .build();

        assert_eq!(
            q.sql,
            "SELECT id FROM users WHERE ( user_login LIKE ? OR display_name LIKE ? )"
        );
        assert_eq!(q.params.len(), 2);
    }

    #[test]
    fn test_single_child_group_has_no_parens() {
        let q = QueryBuilder::new("users")
            .select("id")
            .filter(Predicate::AnyOf(vec![Predicate::like(
                "user_email",
                like_pattern("a"),
            )]))
            .build();

        assert_eq!(q.sql, "SELECT id FROM users WHERE user_email LIKE ?");
    }

    #[test]
    fn test_in_select_subquery() {
        let q = QueryBuilder::new("users u")
            .select("u.id")
            .filter(Predicate::in_select(
                "u.id",
                "user_id",
                "profile_data",
                Predicate::AllOf(vec![
                    Predicate::like("value", like_pattern("x")),
                    Predicate::raw("field_id IN ( 1,2 )"),
                ]),
            ))
            .build();

        assert_eq!(
            q.sql,
            "SELECT u.id FROM users u WHERE u.id IN ( SELECT user_id FROM profile_data \
             WHERE ( value LIKE ? AND field_id IN ( 1,2 ) ) )"
        );
        assert_eq!(q.params, vec!["%x%".to_string()]);
    }

    #[test]
    fn test_select_params_come_first() {
        let q = QueryBuilder::new("users u")
            .select("u.id")
            .select_param("u.display_name LIKE ? AS relevance", like_pattern("t"))
            .filter(Predicate::like("u.user_login", like_pattern("u")))
            .group_by("u.id")
            .build();

        assert_eq!(q.params, vec!["%t%".to_string(), "%u%".to_string()]);
        assert!(q.sql.ends_with(" GROUP BY u.id"));
    }
}
