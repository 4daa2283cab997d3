//! Template buffer renderer / 模板缓冲渲染
//!
//! Result-item fragments are embedded at compile time from the project's
//! `templates/` directory. Rendering is buffer-style: look the template up by
//! name (with an optional type variant), substitute `{{key}}` placeholders
//! with HTML-escaped values, return the HTML string.

use rust_embed::RustEmbed;

/// Embedded template files / 嵌入模板文件
#[derive(RustEmbed)]
#[folder = "templates"]
struct TemplateAssets;

/// Render a template part into an HTML string / 渲染模板片段
///
/// Lookup order: `<name>-<template_type>.html`, then `<name>.html`.
/// Unknown templates render to an empty string (the platform decides what a
/// missing fragment means).
pub fn buffer_template_part(name: &str, template_type: &str, ctx: &[(&str, &str)]) -> String {
    let candidates = if template_type.is_empty() {
        vec![format!("{}.html", name)]
    } else {
        vec![
            format!("{}-{}.html", name, template_type),
            format!("{}.html", name),
        ]
    };

    for candidate in &candidates {
        if let Some(content) = TemplateAssets::get(candidate) {
            let source = String::from_utf8_lossy(&content.data).into_owned();
            return substitute(&source, ctx);
        }
    }

    tracing::warn!("Template part not found: {} (type: {})", name, template_type);
    String::new()
}

/// Replace `{{key}}` placeholders with escaped values / 替换占位符
fn substitute(source: &str, ctx: &[(&str, &str)]) -> String {
    let mut out = source.to_string();
    for (key, value) in ctx {
        let placeholder = format!("{{{{{}}}}}", key);
        let escaped = html_escape::encode_text(value);
        out = out.replace(&placeholder, &escaped);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_escapes_values() {
        let html = substitute(
            "<a href=\"/members/{{id}}\">{{title}}</a>",
            &[("id", "5"), ("title", "Joe <script>")],
        );
        assert_eq!(
            html,
            "<a href=\"/members/5\">Joe &lt;script&gt;</a>"
        );
    }

    #[test]
    fn test_member_loop_template_exists() {
        let html = buffer_template_part(
            "loop/member",
            "",
            &[
                ("id", "5"),
                ("title", "Joe"),
                ("login", "joe"),
                ("last_active", "2024-01-01 00:00:00"),
            ],
        );
        assert!(html.contains("Joe"));
        assert!(html.contains("members"));
    }

    #[test]
    fn test_type_variant_falls_back_to_base() {
        let plain = buffer_template_part("loop/member", "", &[("title", "T")]);
        let unknown_variant = buffer_template_part("loop/member", "no-such-variant", &[("title", "T")]);
        assert_eq!(plain, unknown_variant);

        let compact = buffer_template_part("loop/member", "compact", &[("title", "T")]);
        assert_ne!(compact, plain);
    }

    #[test]
    fn test_missing_template_renders_empty() {
        assert!(buffer_template_part("loop/no-such", "", &[]).is_empty());
    }
}
