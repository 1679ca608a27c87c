//! Tests for the tool contract and registry dispatch.

mod common;

use std::sync::Arc;

use mnemo::tools::{FnTool, ToolArguments, ToolParameters, ToolRegistry};
use mnemo::types::ToolCallRequest;
use pretty_assertions::assert_eq;

use common::{failing_tool, sleepy_tool};

fn call(id: &str, name: &str, args: serde_json::Value) -> ToolCallRequest {
    ToolCallRequest {
        id: id.to_string(),
        name: name.to_string(),
        arguments: args,
    }
}

#[tokio::test]
async fn fn_tool_invokes_handler() {
    let tool = FnTool::new(
        "greet",
        "Greets by name",
        ToolParameters::object()
            .string("name", "Who to greet", true)
            .build(),
        |args| async move {
            let name = args.get_str("name")?.to_string();
            Ok(serde_json::json!({ "greeting": format!("hello {name}") }))
        },
    );

    let registry = ToolRegistry::builder()
        .register(Arc::new(tool))
        .unwrap()
        .build();

    let result = registry
        .dispatch(&call("c1", "greet", serde_json::json!({"name": "ada"})), 1_000)
        .await;
    assert!(!result.is_error);
    assert_eq!(result.content["greeting"], "hello ada");
}

#[tokio::test]
async fn specs_follow_registration_order() {
    let registry = ToolRegistry::builder()
        .register(sleepy_tool("zeta", 0))
        .unwrap()
        .register(sleepy_tool("alpha", 0))
        .unwrap()
        .build();

    let names: Vec<String> = registry.specs().into_iter().map(|s| s.name).collect();
    assert_eq!(names, ["zeta", "alpha"]);
}

#[tokio::test]
async fn duplicate_name_is_rejected_at_build_time() {
    let err = ToolRegistry::builder()
        .register(sleepy_tool("dup", 0))
        .unwrap()
        .register(sleepy_tool("dup", 0))
        .err()
        .unwrap();
    assert!(err.to_string().contains("duplicate tool name"));
}

#[tokio::test]
async fn unknown_tool_becomes_error_result() {
    let registry = ToolRegistry::empty();

    let result = registry
        .dispatch(&call("c1", "nope", serde_json::json!({})), 1_000)
        .await;
    assert!(result.is_error);
    assert_eq!(result.call_id, "c1");
    assert!(result.content["error"]
        .as_str()
        .unwrap()
        .contains("unknown tool 'nope'"));
}

#[tokio::test]
async fn tool_failure_becomes_error_result() {
    let registry = ToolRegistry::builder()
        .register(failing_tool("bomb", "it broke"))
        .unwrap()
        .build();

    let result = registry
        .dispatch(&call("c1", "bomb", serde_json::json!({})), 1_000)
        .await;
    assert!(result.is_error);
    assert!(result.content["error"].as_str().unwrap().contains("it broke"));
}

#[tokio::test]
async fn slow_tool_times_out_as_error_result() {
    let registry = ToolRegistry::builder()
        .register(sleepy_tool("slow", 5_000))
        .unwrap()
        .build();

    let result = registry
        .dispatch(&call("c1", "slow", serde_json::json!({})), 20)
        .await;
    assert!(result.is_error);
    assert!(result.content["error"].as_str().unwrap().contains("timed out"));
}

#[test]
fn arguments_accept_string_encoded_json() {
    #[derive(serde::Deserialize)]
    struct Params {
        query: String,
    }

    let args = ToolArguments::new(serde_json::Value::String(
        "{\"query\": \"rust\"}".to_string(),
    ));
    let params: Params = args.deserialize().unwrap();
    assert_eq!(params.query, "rust");
}
