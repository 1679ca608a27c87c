//! Built-in web-grounding tools (`web_search`, `fetch_page`).
//!
//! These are ordinary [`Tool`] implementations the caller registers
//! explicitly; nothing in the loop depends on them. Network failures
//! surface as tool errors, which the registry converts to error results.

use std::sync::Arc;

use futures::StreamExt;
use regex::Regex;
use std::sync::OnceLock;

use crate::error::{MnemoError, Result};
use crate::model::http::shared_client;
use crate::tools::tool::{FnTool, Tool};
use crate::tools::types::ToolParameters;

const PAGE_MAX_CHARS: usize = 16_384;
const PAGE_MAX_FETCH_BYTES: usize = 512 * 1024;
const SNIPPET_MAX_RESULTS: usize = 10;

/// Read a response body up to `max_bytes`, dropping the rest of the
/// stream instead of materializing it. Returns the bytes read and whether
/// the body was cut short.
async fn read_body_capped(
    response: reqwest::Response,
    max_bytes: usize,
) -> Result<(Vec<u8>, bool)> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let room = max_bytes - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            return Ok((body, true));
        }
        body.extend_from_slice(&chunk);
    }
    Ok((body, false))
}

fn truncate_utf8(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut cutoff = max_bytes;
    while cutoff > 0 && !s.is_char_boundary(cutoff) {
        cutoff -= 1;
    }
    s[..cutoff].to_string()
}

/// Reduce an HTML document to readable text: drop script/style blocks,
/// strip the remaining tags, collapse whitespace.
fn html_to_text(html: &str) -> String {
    static BLOCKS: OnceLock<Regex> = OnceLock::new();
    static TAGS: OnceLock<Regex> = OnceLock::new();
    static SPACE: OnceLock<Regex> = OnceLock::new();

    let blocks = BLOCKS.get_or_init(|| {
        Regex::new(r"(?is)<(script|style|noscript)\b.*?</(script|style|noscript)>").unwrap()
    });
    let tags = TAGS.get_or_init(|| Regex::new(r"(?s)<[^>]+>").unwrap());
    let space = SPACE.get_or_init(|| Regex::new(r"\s+").unwrap());

    let stripped = blocks.replace_all(html, " ");
    let stripped = tags.replace_all(&stripped, " ");
    space.replace_all(&stripped, " ").trim().to_string()
}

/// Create the `fetch_page` tool — fetches a URL and returns its readable text.
///
/// HTML is reduced to plain text; output is capped to keep the model
/// context bounded.
pub fn fetch_page_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "fetch_page",
        "Fetch a web page by URL and return its readable text content",
        ToolParameters::object()
            .string("url", "The http(s) URL to fetch", true)
            .build(),
        |args| async move {
            let url = args.get_str("url")?.to_string();
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(MnemoError::InvalidArgument(format!(
                    "unsupported URL scheme: {url}"
                )));
            }

            let response = shared_client().get(&url).send().await?;
            let status = response.status().as_u16();
            if !(200..300).contains(&status) {
                return Err(MnemoError::ToolExecution {
                    tool_name: "fetch_page".into(),
                    message: format!("GET {url} returned status {status}"),
                });
            }

            let is_html = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|ct| ct.contains("html"))
                .unwrap_or(true);
            let (body, capped) = read_body_capped(response, PAGE_MAX_FETCH_BYTES).await?;
            let body = String::from_utf8_lossy(&body);
            let text = if is_html {
                html_to_text(&body)
            } else {
                body.into_owned()
            };

            let truncated = capped || text.len() > PAGE_MAX_CHARS;
            let content = truncate_utf8(&text, PAGE_MAX_CHARS);
            Ok(serde_json::json!({
                "url": url,
                "content": content,
                "truncated": truncated,
            }))
        },
    ))
}

/// Create the `web_search` tool against a JSON search endpoint.
///
/// The endpoint is queried with `?q=<query>`; an optional bearer key is
/// attached. Results are normalized to `{title, url, snippet}` triples
/// when the response shape allows, otherwise the raw body is returned
/// truncated.
pub fn web_search_tool(endpoint: impl Into<String>, api_key: Option<String>) -> Arc<dyn Tool> {
    let endpoint = endpoint.into();
    Arc::new(FnTool::new(
        "web_search",
        "Search the web and return result titles, URLs, and snippets",
        ToolParameters::object()
            .string("query", "The search query", true)
            .integer("count", "Maximum number of results", false)
            .build(),
        move |args| {
            let endpoint = endpoint.clone();
            let api_key = api_key.clone();
            async move {
                let query = args.get_str("query")?.to_string();
                let count = args
                    .get_i64_opt("count")
                    .map(|n| n.clamp(1, SNIPPET_MAX_RESULTS as i64) as usize)
                    .unwrap_or(5);

                let mut request = shared_client().get(&endpoint).query(&[("q", &query)]);
                if let Some(key) = &api_key {
                    request = request.bearer_auth(key);
                }

                let response = request.send().await?;
                let status = response.status().as_u16();
                if !(200..300).contains(&status) {
                    return Err(MnemoError::ToolExecution {
                        tool_name: "web_search".into(),
                        message: format!("search endpoint returned status {status}"),
                    });
                }

                let body: serde_json::Value = response.json().await?;
                let results = extract_results(&body, count);
                match results {
                    Some(results) => Ok(serde_json::json!({
                        "query": query,
                        "results": results,
                    })),
                    None => Ok(serde_json::json!({
                        "query": query,
                        "raw": truncate_utf8(&body.to_string(), PAGE_MAX_CHARS),
                    })),
                }
            }
        },
    ))
}

/// Pull a `{title, url, snippet}` list out of common search response shapes.
fn extract_results(body: &serde_json::Value, count: usize) -> Option<Vec<serde_json::Value>> {
    let items = body
        .get("results")
        .or_else(|| body.get("items"))
        .or_else(|| body.get("web").and_then(|w| w.get("results")))?
        .as_array()?;

    let normalized = items
        .iter()
        .take(count)
        .map(|item| {
            serde_json::json!({
                "title": item.get("title").and_then(|v| v.as_str()).unwrap_or_default(),
                "url": item
                    .get("url")
                    .or_else(|| item.get("link"))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default(),
                "snippet": item
                    .get("snippet")
                    .or_else(|| item.get("description"))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default(),
            })
        })
        .collect();
    Some(normalized)
}
