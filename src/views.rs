// Per-command views. Each one picks the fields its command cares about,
// collapses list-of-mapping fields into one line, hides probe data unless
// asked for, and hands the result to the generic printer in `render`.

use crate::render::{entries, entry, heading, RenderContext, RenderError, ViewOptions, PROBE_HINT};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Entry of a `context` list; only the link is shown.
#[derive(Debug, Default, Deserialize)]
struct ContextEntry {
    #[serde(default)]
    link: Value,
}

/// Entry of `searchResultsList`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit {
    #[serde(default)]
    link: Value,
    #[serde(default)]
    similarity_score: Value,
    #[serde(default)]
    contents: Value,
}

/// Collapse a list of context mappings into the list of their links.
/// Anything that is not a list becomes null.
fn links(context: Option<&Value>) -> Value {
    match context {
        Some(Value::Array(items)) => Value::Array(
            items
                .iter()
                .map(|item| {
                    serde_json::from_value::<ContextEntry>(item.clone())
                        .unwrap_or_default()
                        .link
                })
                .collect(),
        ),
        _ => Value::Null,
    }
}

fn field(map: &Map<String, Value>, key: &str) -> Value {
    map.get(key).cloned().unwrap_or(Value::Null)
}

/// Copy `src` into `dst` minus `skip`, dropping `probe` unless requested.
fn copy_rest(dst: &mut Map<String, Value>, src: &Map<String, Value>, skip: &[&str], opts: &ViewOptions) {
    for (key, value) in src {
        if skip.contains(&key.as_str()) || (key == "probe" && !opts.show_probe) {
            continue;
        }
        dst.insert(key.clone(), value.clone());
    }
}

fn probe_hint(view: &mut Map<String, Value>, opts: &ViewOptions) {
    if !opts.show_probe {
        view.insert("probe".to_string(), Value::String(PROBE_HINT.to_string()));
    }
}

/// Answer to a question: question, answer and source links first.
pub fn answer(payload: &Value, opts: &ViewOptions, ctx: &RenderContext) -> Result<String, RenderError> {
    let Some(map) = payload.as_object() else {
        return crate::render::default_view(payload, opts, ctx);
    };
    let mut view = Map::new();
    view.insert("question".to_string(), field(map, "question"));
    view.insert("answer".to_string(), field(map, "answer"));
    view.insert("links".to_string(), links(map.get("context")));
    copy_rest(&mut view, map, &["question", "answer", "context"], opts);
    probe_hint(&mut view, opts);

    let mut out = String::new();
    entries(&mut out, "", &view, ctx);
    Ok(out)
}

/// System details with the `params` block shown as its own section.
pub fn system(payload: &Value, opts: &ViewOptions, ctx: &RenderContext) -> Result<String, RenderError> {
    let Some(map) = payload.as_object() else {
        return crate::render::default_view(payload, opts, ctx);
    };
    let mut rest = Map::new();
    copy_rest(&mut rest, map, &["params"], &ViewOptions { show_probe: true });

    let mut out = String::new();
    entries(&mut out, "", &rest, ctx);
    match map.get("params") {
        Some(Value::Object(params)) => {
            heading(&mut out, "", "params", ctx);
            entries(&mut out, "\t", params, ctx);
        }
        other => entry(
            &mut out,
            "",
            "params",
            &crate::render::scalar(other.unwrap_or(&Value::Null)),
            ctx,
        ),
    }
    Ok(out)
}

/// A previously asked question. The answer is stored as a JSON string under
/// `llm_response`; a payload without it cannot be shown.
pub fn question_detail(
    payload: &Value,
    opts: &ViewOptions,
    ctx: &RenderContext,
) -> Result<String, RenderError> {
    let map = payload
        .as_object()
        .ok_or(RenderError::MissingField("llm_response"))?;
    let raw = map
        .get("llm_response")
        .and_then(Value::as_str)
        .ok_or(RenderError::MissingField("llm_response"))?;
    let llm: Map<String, Value> = serde_json::from_str(raw).map_err(RenderError::EmbeddedJson)?;

    let mut view = Map::new();
    copy_rest(&mut view, &llm, &["context"], opts);
    view.insert("links".to_string(), links(llm.get("context")));
    probe_hint(&mut view, opts);

    let mut rest = Map::new();
    copy_rest(&mut rest, map, &["llm_response"], &ViewOptions { show_probe: true });

    let mut out = String::new();
    heading(&mut out, "", "llm_response", ctx);
    entries(&mut out, "\t", &view, ctx);
    entries(&mut out, "", &rest, ctx);
    Ok(out)
}

/// Semantic search results, one numbered block per hit.
pub fn search_results(
    payload: &Value,
    opts: &ViewOptions,
    ctx: &RenderContext,
) -> Result<String, RenderError> {
    let Some(map) = payload.as_object() else {
        return crate::render::default_view(payload, opts, ctx);
    };
    let question = map
        .get("question")
        .or_else(|| map.get("query"))
        .cloned()
        .unwrap_or(Value::Null);
    let mut view = Map::new();
    view.insert("question".to_string(), question);
    copy_rest(
        &mut view,
        map,
        &["question", "query", "searchResultsList", "type"],
        opts,
    );
    probe_hint(&mut view, opts);

    let mut out = String::new();
    entries(&mut out, "", &view, ctx);

    let Some(Value::Array(hits)) = map.get("searchResultsList") else {
        entry(&mut out, "", "searchResultsList", "null", ctx);
        return Ok(out);
    };
    heading(&mut out, "", "searchResultsList", ctx);
    for (idx, item) in hits.iter().enumerate() {
        let hit: SearchHit = serde_json::from_value(item.clone()).unwrap_or_default();
        out.push('\n');
        heading(&mut out, "", &format!("Result {}", idx + 1), ctx);
        entry(&mut out, "\t", "link", &crate::render::scalar(&hit.link), ctx);
        entry(&mut out, "\t", "score", &crate::render::scalar(&hit.similarity_score), ctx);
        entry(&mut out, "\t", "text", &crate::render::scalar(&hit.contents), ctx);
    }
    Ok(out)
}
