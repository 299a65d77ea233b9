//! Template rendering: merges a `RenderContext` into an HTML template fragment.
//!
//! Pipeline: `lexer` (marker tokens) → `parser` (node tree) → `engine`
//! (depth-first evaluation). Rendering is a pure function of its two inputs:
//! no I/O, no caches, no shared state. Malformed markers degrade to literal
//! text and are reported as diagnostics rather than errors.

pub mod diagnostic;
pub mod engine;
pub mod helpers;
pub mod lexer;
pub mod parser;
pub mod value;

use serde::Serialize;

pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use value::{RenderContext, Value};

use crate::render::parser::Node;

/// A parsed, immutable template.
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<Node>,
    diagnostics: Vec<Diagnostic>,
}

impl Template {
    pub fn parse(source: &str) -> Self {
        let (tokens, mut diagnostics) = lexer::tokenize(source);
        let nodes = parser::parse(&tokens, &mut diagnostics);
        Self { nodes, diagnostics }
    }

    /// Problems found while parsing, in source order. Empty for a well-formed template.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn render(&self, ctx: &RenderContext) -> String {
        engine::render_nodes(&self.nodes, ctx)
    }
}

/// Rendered HTML plus anything that had to be passed through literally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutput {
    pub html: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl RenderOutput {
    pub fn is_degraded(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Renders `source` against `ctx`, discarding diagnostics.
#[allow(dead_code)]
pub fn render(source: &str, ctx: &RenderContext) -> String {
    Template::parse(source).render(ctx)
}

pub fn render_with_diagnostics(source: &str, ctx: &RenderContext) -> RenderOutput {
    let template = Template::parse(source);
    RenderOutput {
        html: template.render(ctx),
        diagnostics: template.diagnostics().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(json: serde_json::Value) -> RenderContext {
        match Value::from(json) {
            Value::Map(map) => map,
            _ => panic!("context must be an object"),
        }
    }

    const EXP_TEMPLATE: &str =
        "<p>{{name}}</p>{{#each exp}}<li>{{title}} at {{company}}</li>{{/each}}";

    #[test]
    fn test_each_expands_items_in_order() {
        let c = ctx(json!({
            "name": "Jane Doe",
            "exp": [
                {"title": "Engineer", "company": "Acme"},
                {"title": "Lead", "company": "Globex"}
            ]
        }));
        assert_eq!(
            render(EXP_TEMPLATE, &c),
            "<p>Jane Doe</p><li>Engineer at Acme</li><li>Lead at Globex</li>"
        );
    }

    #[test]
    fn test_empty_list_renders_nothing() {
        let c = ctx(json!({"name": "Jane Doe", "exp": []}));
        assert_eq!(render(EXP_TEMPLATE, &c), "<p>Jane Doe</p>");
    }

    #[test]
    fn test_missing_name_renders_empty() {
        let c = ctx(json!({
            "exp": [
                {"title": "Engineer", "company": "Acme"},
                {"title": "Lead", "company": "Globex"}
            ]
        }));
        assert_eq!(
            render(EXP_TEMPLATE, &c),
            "<p></p><li>Engineer at Acme</li><li>Lead at Globex</li>"
        );
    }

    #[test]
    fn test_missing_list_renders_nothing() {
        let c = ctx(json!({"name": "Jane Doe"}));
        assert_eq!(render(EXP_TEMPLATE, &c), "<p>Jane Doe</p>");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let c = ctx(json!({
            "name": "Jane",
            "flag": true,
            "exp": [{"title": "A"}, {"title": "B"}]
        }));
        let template = "{{#if flag}}{{name}}{{/if}}{{#each exp}}{{@index}}:{{title}};{{/each}}";
        let first = render(template, &c);
        for _ in 0..5 {
            assert_eq!(render(template, &c), first);
        }
        assert_eq!(first, "Jane0:A;1:B;");
    }

    #[test]
    fn test_empty_template_and_empty_context() {
        assert_eq!(render("", &RenderContext::new()), "");
        assert_eq!(
            render("<b>{{a}}</b><i>{{b.c}}</i>", &RenderContext::new()),
            "<b></b><i></i>"
        );
    }

    #[test]
    fn test_conditional_truthiness() {
        let c = ctx(json!({
            "yes": "x", "empty": "", "on": true, "off": false, "list": [1], "none": []
        }));
        let t = "{{#if yes}}1{{/if}}{{#if empty}}2{{/if}}{{#if on}}3{{/if}}{{#if off}}4{{/if}}\
                 {{#if list}}5{{/if}}{{#if none}}6{{/if}}{{#if unknown}}7{{/if}}";
        assert_eq!(render(t, &c), "135");
    }

    #[test]
    fn test_else_and_unless() {
        let c = ctx(json!({"end_date": "", "is_current": true}));
        assert_eq!(
            render("{{#if end_date}}{{end_date}}{{else}}Present{{/if}}", &c),
            "Present"
        );
        assert_eq!(render("{{#unless is_current}}past{{else}}now{{/unless}}", &c), "now");
        assert_eq!(render("{{#each none}}x{{else}}empty{{/each}}", &c), "empty");
    }

    #[test]
    fn test_section_inside_conditional() {
        let t = "{{#if exp}}<ul>{{#each exp}}<li>{{title}}</li>{{/each}}</ul>{{/if}}";
        let with = ctx(json!({"exp": [{"title": "A"}, {"title": "B"}]}));
        let without = ctx(json!({"exp": []}));
        assert_eq!(render(t, &with), "<ul><li>A</li><li>B</li></ul>");
        assert_eq!(render(t, &without), "");
    }

    #[test]
    fn test_conditional_inside_section_uses_item_scope() {
        let t = "{{#each exp}}{{title}}{{#if is_current}} (now){{/if}};{{/each}}";
        let c = ctx(json!({
            "is_current": true,
            "exp": [
                {"title": "A", "is_current": false},
                {"title": "B", "is_current": true}
            ]
        }));
        assert_eq!(render(t, &c), "A;B (now);");
    }

    #[test]
    fn test_item_fields_shadow_outer_and_outer_stays_visible() {
        let t = "{{#each exp}}{{name}}/{{owner}}/{{../name}} {{/each}}";
        let c = ctx(json!({
            "name": "outer",
            "owner": "Jane",
            "exp": [{"name": "inner"}]
        }));
        assert_eq!(render(t, &c), "inner/Jane/outer ");
    }

    #[test]
    fn test_nested_sections() {
        let t = "{{#each groups}}[{{label}}:{{#each items}}{{this}}{{/each}}]{{/each}}";
        let c = ctx(json!({
            "groups": [
                {"label": "a", "items": ["1", "2"]},
                {"label": "b", "items": []}
            ]
        }));
        assert_eq!(render(t, &c), "[a:12][b:]");
    }

    #[test]
    fn test_django_dialect_matches_handlebars() {
        let c = ctx(json!({
            "name": "John",
            "skills_data": [{"name": "JavaScript"}, {"name": "Python"}]
        }));
        assert_eq!(render("{% if name %}<p>{{name}}</p>{% endif %}", &c), "<p>John</p>");
        assert_eq!(
            render(
                "{% for skill in skills_data %}<li>{{skill.name}}</li>{% endfor %}",
                &c
            ),
            "<li>JavaScript</li><li>Python</li>"
        );
        assert_eq!(render("{% if not missing %}none{% else %}some{% endif %}", &c), "none");
    }

    #[test]
    fn test_each_as_alias() {
        let c = ctx(json!({"exp": [{"position": "Dev"}]}));
        assert_eq!(
            render("{{#each exp as |job|}}{{job.position}}{{/each}}", &c),
            "Dev"
        );
    }

    #[test]
    fn test_slices() {
        let c = ctx(json!({
            "exp": {"start_date": "2020-01-15"},
            "name": "John Doe",
            "year": "2020"
        }));
        assert_eq!(render("<p>{{exp.start_date[:4]}}</p>", &c), "<p>2020</p>");
        assert_eq!(render("<p>{{name[4:]}}</p>", &c), "<p> Doe</p>");
        assert_eq!(render("<p>{{year[-4:]}}</p>", &c), "<p>2020</p>");
    }

    #[test]
    fn test_slices_inside_for_loop() {
        let t = "{% for exp in experience_data %}<p>{{exp.start_date[:4]}} - {{exp.end_date[:4]}}</p>{% endfor %}";
        let c = ctx(json!({
            "experience_data": [
                {"start_date": "2020-01-15", "end_date": "2022-12-31"},
                {"start_date": "2018-06-01", "end_date": "2019-08-15"}
            ]
        }));
        assert_eq!(
            render(t, &c),
            "<p>2020 - 2022</p><p>2018 - 2019</p>"
        );
    }

    #[test]
    fn test_helpers_in_templates() {
        let c = ctx(json!({
            "start_date": "2020-01-15",
            "skills_data": [{"name": "Rust", "level": 4}],
            "description": "line one\n<b>line two</b>"
        }));
        assert_eq!(render("<p>{{year start_date}}</p>", &c), "<p>2020</p>");
        assert_eq!(render("{{first start_date 7}}", &c), "2020-01");
        assert_eq!(
            render(
                "{{#if (hasItems skills_data)}}{{#each skills_data}}{{percentage level}}%{{/each}}{{/if}}",
                &c
            ),
            "80%"
        );
        assert_eq!(
            render("{{nl2br description}}", &c),
            "line one<br>&lt;b&gt;line two&lt;/b&gt;"
        );
    }

    #[test]
    fn test_values_are_inserted_as_literal_text() {
        let c = ctx(json!({"summary": "<script>alert(1)</script> & \"co\""}));
        assert_eq!(
            render("<p>{{summary}}</p>", &c),
            "<p>&lt;script&gt;alert(1)&lt;/script&gt; &amp; &quot;co&quot;</p>"
        );
        assert_eq!(
            render("{{{summary}}}", &c),
            "<script>alert(1)</script> & \"co\""
        );
    }

    #[test]
    fn test_template_text_is_never_reencoded() {
        let t = "<p class=\"a\">&amp; {{x}}</p>";
        let c = ctx(json!({"x": "&amp;"}));
        assert_eq!(render(t, &c), "<p class=\"a\">&amp; &amp;amp;</p>");
    }

    #[test]
    fn test_loop_metadata() {
        let c = ctx(json!({"xs": ["a", "b", "c"]}));
        assert_eq!(
            render("{{#each xs}}{{#if @first}}[{{/if}}{{this}}{{#unless @last}},{{/unless}}{{#if @last}}]{{/if}}{{/each}}", &c),
            "[a,b,c]"
        );
    }

    #[test]
    fn test_unterminated_section_degrades() {
        let c = ctx(json!({"name": "Jane", "exp": [{"title": "A"}]}));
        let out = render_with_diagnostics("<p>{{name}}</p>{{#each exp}}<li>{{title}}</li>", &c);
        assert!(out.is_degraded());
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::UnterminatedBlock);
        assert_eq!(out.html, "<p>Jane</p>{{#each exp}}<li></li>");
    }

    #[test]
    fn test_unterminated_tag_degrades() {
        let c = ctx(json!({"name": "Jane"}));
        let out = render_with_diagnostics("<p>{{name}}</p><p>{{name</p>", &c);
        assert!(out.is_degraded());
        assert_eq!(out.html, "<p>Jane</p><p>{{name</p>");
    }

    #[test]
    fn test_well_formed_template_has_no_diagnostics() {
        let out = render_with_diagnostics(EXP_TEMPLATE, &RenderContext::new());
        assert!(!out.is_degraded());
        assert_eq!(out.html, "<p></p>");
    }

    #[test]
    fn test_template_reuse() {
        let template = Template::parse("{{a}}");
        assert_eq!(template.render(&ctx(json!({"a": "1"}))), "1");
        assert_eq!(template.render(&ctx(json!({"a": "2"}))), "2");
    }
}
