//! Text templates for reshaping JSON payloads.
//!
//! Templates use Go's `text/template` syntax through the `gtmpl` engine, with
//! `json` and `slice` registered on top of its builtins. Output is not
//! escaped; use `json` or `html` explicitly.
//!
//! An empty payload renders against an empty map and JSON `null` prints as
//! nothing. Missing keys follow the engine and print `<no value>`.

pub mod cache;
mod funcs;

pub use cache::{Fingerprint, TemplateCache};

use std::fmt;

use gtmpl::Context;
use serde_json::Value;
use thiserror::Error;

/// Deepest allowed nesting of blocks and parenthesized pipelines.
const MAX_DEPTH: usize = 100;

/// Errors raised while compiling or rendering a template.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    Exec(String),
}

impl TemplateError {
    pub(crate) fn exec(message: impl Into<String>) -> Self {
        Self::Exec(message.into())
    }
}

/// A compiled template, safe to share between concurrent renders.
pub struct Template {
    source: String,
    compiled: gtmpl::Template,
}

impl Template {
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        check_depth(source)?;

        let mut compiled = gtmpl::Template::default();
        compiled.add_func("json", funcs::json);
        compiled.add_func("slice", funcs::slice);
        compiled
            .parse(source)
            .map_err(|e| TemplateError::Parse(e.to_string()))?;

        Ok(Self {
            source: source.to_string(),
            compiled,
        })
    }

    /// Render against `data`, bound to `.` and `$`.
    pub fn render(&self, data: &Value) -> Result<Vec<u8>, TemplateError> {
        let context = Context::from(funcs::to_engine(data));
        self.compiled
            .render(&context)
            .map(String::into_bytes)
            .map_err(|e| TemplateError::exec(e.to_string()))
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Reject sources nested deeper than [`MAX_DEPTH`] before the engine's
/// recursive parser sees them.
fn check_depth(source: &str) -> Result<(), TemplateError> {
    let mut blocks = 0usize;
    let mut deepest = 0usize;
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else { break };
        let action = after[..end].trim_start_matches('-').trim();
        rest = &after[end + 2..];

        match action.split_whitespace().next() {
            Some("if" | "range" | "with" | "define" | "block") => blocks += 1,
            Some("end") => blocks = blocks.saturating_sub(1),
            _ => {}
        }

        let mut parens = 0usize;
        for c in action.chars() {
            match c {
                '(' => {
                    parens += 1;
                    deepest = deepest.max(blocks + parens);
                }
                ')' => parens = parens.saturating_sub(1),
                _ => {}
            }
        }
        deepest = deepest.max(blocks);

        if deepest > MAX_DEPTH {
            return Err(TemplateError::Parse(format!(
                "template nested deeper than {MAX_DEPTH} levels"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(src: &str, data: Value) -> String {
        let out = Template::compile(src).unwrap().render(&data).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_remap_single_field() {
        assert_eq!(
            render(r#"{"mapped":"{{.value}}"}"#, json!({"value": "hello"})),
            r#"{"mapped":"hello"}"#
        );
    }

    #[test]
    fn test_static_payload() {
        assert_eq!(render("static-payload", Value::Null), "static-payload");
        assert_eq!(render("", json!({"a": 1})), "");
    }

    #[test]
    fn test_null_renders_empty() {
        assert_eq!(render("[{{.x}}]", json!({"x": null})), "[]");
        assert_eq!(render("{{if .x}}set{{else}}unset{{end}}", json!({"x": null})), "unset");
    }

    #[test]
    fn test_empty_body_field_access_renders() {
        let template = Template::compile("[{{.x}}]").unwrap();
        assert!(template.render(&Value::Null).is_ok());
    }

    #[test]
    fn test_json_builtin_keeps_output_valid() {
        let out = render(
            r#"{"text":{{json .msg}},"tags":{{json .tags}}}"#,
            json!({"msg": "line\n\"quoted\"", "tags": ["a", "b"]}),
        );
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!({"text": "line\n\"quoted\"", "tags": ["a", "b"]}));
    }

    #[test]
    fn test_slack_style_remap() {
        let src = r#"{"text":"{{.alert.name}} is {{if .alert.firing}}FIRING{{else}}resolved{{end}}"{{range .alert.labels}},"{{.}}"{{end}}}"#;
        let data = json!({"alert": {"name": "disk", "firing": true, "labels": ["x"]}});
        assert_eq!(render(src, data), r#"{"text":"disk is FIRING","x"}"#);
    }

    #[test]
    fn test_go_builtins() {
        let data = json!({"price": 19.999, "n": 7, "q": "a b&c", "items": [1, 2, 3]});
        assert_eq!(render(r#"{{printf "%.2f" .price}}"#, data.clone()), "20.00");
        assert_eq!(render(r#"{{printf "%05d" .n}}"#, data.clone()), "00007");
        assert_eq!(render("{{json (slice .items 1 2)}}", data.clone()), "[2]");
        for src in ["{{urlquery .q}}", "{{js .q}}", "{{html .q}}"] {
            let out = render(src, data.clone());
            assert!(!out.is_empty() && out != "a b&c", "{src} gave {out:?}");
        }
    }

    #[test]
    fn test_trim_markers_and_comments() {
        assert_eq!(render("a  {{- .x -}}  b", json!({"x": 1})), "a1b");
        assert_eq!(render("a{{/* note */}}b", json!({})), "ab");
    }

    #[test]
    fn test_top_level_array_and_scalar_data() {
        assert_eq!(render("{{len .}}:{{index . 1}}", json!([1, 2, 3])), "3:2");
        assert_eq!(render("{{.}}", json!(42)), "42");
        assert_eq!(render("{{.}}", json!("s")), "s");
    }

    #[test]
    fn test_compile_errors() {
        assert!(Template::compile("{{.x").is_err());
        assert!(Template::compile("{{if .x}}").is_err());
        assert!(Template::compile("{{nope}}").is_err());
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let deep = format!("{}x{}", "{{if 1}}".repeat(MAX_DEPTH + 1), "{{end}}".repeat(MAX_DEPTH + 1));
        assert!(matches!(Template::compile(&deep), Err(TemplateError::Parse(_))));

        let parens = format!("{{{{{}1{}}}}}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert!(matches!(Template::compile(&parens), Err(TemplateError::Parse(_))));

        let ok = format!("{}x{}", "{{if 1}}".repeat(10), "{{end}}".repeat(10));
        assert_eq!(render(&ok, Value::Null), "x");
    }

    #[test]
    fn test_exec_error_on_scalar_field() {
        let template = Template::compile("{{.a.b}}").unwrap();
        assert!(matches!(
            template.render(&json!({"a": 5})),
            Err(TemplateError::Exec(_))
        ));
    }

    #[test]
    fn test_non_ascii_passthrough() {
        assert_eq!(render("héllo {{.n}} ✓", json!({"n": "wörld"})), "héllo wörld ✓");
    }
}
