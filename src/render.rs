// Response rendering: turns a parsed payload into the indented
// `key : value` text block shown on the console. Whether ANSI styles are
// emitted is decided by the `RenderContext` passed in, never by global state.

use crate::api::{RawResponse, ServiceResponse};
use crossterm::style::{style, Stylize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Text shown in place of hidden probe data.
pub const PROBE_HINT: &str = "Use --probe to show probe data";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unexpected response: missing `{0}`")]
    MissingField(&'static str),
    #[error("unexpected response: `llm_response` is not a JSON object: {0}")]
    EmbeddedJson(#[source] serde_json::Error),
}

/// Styling decisions for one rendering pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderContext {
    pub color: bool,
}

impl RenderContext {
    pub fn plain() -> Self {
        RenderContext { color: false }
    }

    pub fn colored() -> Self {
        RenderContext { color: true }
    }

    pub fn key(&self, text: &str) -> String {
        if self.color {
            style(text).bold().green().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn value(&self, text: &str) -> String {
        if self.color {
            style(text).white().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn failure(&self, text: &str) -> String {
        if self.color {
            style(text).bold().red().to_string()
        } else {
            text.to_string()
        }
    }
}

/// Per-command switches that affect what is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewOptions {
    pub show_probe: bool,
}

/// Signature shared by every per-command view.
pub type ViewFn = fn(&Value, &ViewOptions, &RenderContext) -> Result<String, RenderError>;

/// One-line display of a value. Strings are shown without quotes, lists as
/// `[a, b]`, and mappings (including those inside lists) as compact JSON.
pub fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(scalar).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(_) => value.to_string(),
    }
}

/// `\n<indent><key> : <value>`
pub fn entry(out: &mut String, indent: &str, key: &str, value: &str, ctx: &RenderContext) {
    out.push('\n');
    out.push_str(indent);
    out.push_str(&ctx.key(key));
    out.push_str(" : ");
    out.push_str(&ctx.value(value));
}

/// Key line that introduces a nested section.
pub fn heading(out: &mut String, indent: &str, key: &str, ctx: &RenderContext) {
    out.push('\n');
    out.push_str(indent);
    out.push_str(&ctx.key(key));
    out.push_str(" : ");
}

/// Print every entry of `map`; nested mappings recurse one tab deeper.
pub fn entries(out: &mut String, indent: &str, map: &Map<String, Value>, ctx: &RenderContext) {
    for (key, value) in map {
        match value {
            Value::Object(nested) => {
                heading(out, indent, key, ctx);
                entries(out, &format!("{indent}\t"), nested, ctx);
            }
            other => entry(out, indent, key, &scalar(other), ctx),
        }
    }
}

/// Generic view used by commands without special field handling.
pub fn default_view(
    payload: &Value,
    _opts: &ViewOptions,
    ctx: &RenderContext,
) -> Result<String, RenderError> {
    let mut out = String::new();
    match payload {
        Value::Object(map) => entries(&mut out, "", map, ctx),
        other => {
            out.push('\n');
            out.push_str(&ctx.value(&scalar(other)));
        }
    }
    Ok(out)
}

pub fn failure(raw: &RawResponse, ctx: &RenderContext) -> String {
    ctx.failure(&format!("Failed: {raw}"))
}

/// Console text for a response: the view on success, the failure line
/// otherwise.
pub fn render_response(
    response: &ServiceResponse,
    view: ViewFn,
    opts: &ViewOptions,
    ctx: &RenderContext,
) -> Result<String, RenderError> {
    match response {
        ServiceResponse::Success { payload, .. } => view(payload, opts, ctx),
        ServiceResponse::Failure { raw } => Ok(failure(raw, ctx)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    #[test]
    fn scalar_forms() {
        assert_eq!(scalar(&Value::Null), "null");
        assert_eq!(scalar(&json!("plain")), "plain");
        assert_eq!(scalar(&json!(1.5)), "1.5");
        assert_eq!(scalar(&json!(["a", 2, null])), "[a, 2, null]");
        assert_eq!(scalar(&json!([{"k": "v"}])), r#"[{"k":"v"}]"#);
    }

    #[test]
    fn nested_maps_indent_with_tabs() {
        let payload = json!({"name": "sys", "params": {"top_k": 5, "deep": {"x": true}}});
        let out = default_view(&payload, &ViewOptions::default(), &RenderContext::plain()).unwrap();
        assert_eq!(
            out,
            "\nname : sys\nparams : \n\ttop_k : 5\n\tdeep : \n\t\tx : true"
        );
    }

    #[test]
    fn entries_keep_payload_order() {
        let payload: Value = serde_json::from_str(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let out = default_view(&payload, &ViewOptions::default(), &RenderContext::plain()).unwrap();
        assert_eq!(out, "\nz : 1\na : 2\nm : 3");
    }

    #[test]
    fn failure_shows_status_and_body() {
        let response =
            ServiceResponse::from_parts(StatusCode::NOT_FOUND, "{\"error\":\"gone\"}".into()).unwrap();
        let out = render_response(
            &response,
            default_view,
            &ViewOptions::default(),
            &RenderContext::plain(),
        )
        .unwrap();
        assert_eq!(out, "Failed: 404 Not Found ==> {\"error\":\"gone\"}");
    }

    #[test]
    fn colored_context_wraps_text() {
        let ctx = RenderContext::colored();
        let key = ctx.key("answer");
        assert!(key.contains("answer"));
        assert_eq!(RenderContext::plain().key("answer"), "answer");
    }
}
