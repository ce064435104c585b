//! Concrete end-to-end scenarios from §8's Testable Properties, driven
//! through `Server::handle_message` the same way a transport would.

use std::sync::Arc;

use futures::FutureExt;
use serde_json::json;

use mcpkit_core::context::RequestContext;
use mcpkit_core::session::{NullSink, Session};
use mcpkit_protocol::jsonrpc::RawFrame;
use mcpkit_protocol::Result;
use mcpkit_server::{HandlerOutput, Outcome, Server, ServerConfig};
use mcpkit_types::{Prompt, PromptArgument, PromptMessage, PromptResult, Resource, Tool};

fn frame(value: serde_json::Value) -> RawFrame {
    serde_json::from_value(value).unwrap()
}

fn new_session() -> Arc<Session> {
    Arc::new(Session::new(RequestContext::minimal_stdio(), Arc::new(NullSink)))
}

async fn expect_response(server: &Arc<Server>, session: &Arc<Session>, req: serde_json::Value) -> serde_json::Value {
    match server.handle_message(frame(req), session).await.unwrap() {
        Outcome::Response(resp) => serde_json::to_value(resp).unwrap(),
        Outcome::NoReply => panic!("expected a response, got NoReply"),
    }
}

fn echo_tool() -> Tool {
    Tool {
        name: "echo".into(),
        description: "echoes the given text".into(),
        input_schema: json!({
            "type": "object",
            "properties": {"text": {"type": "string"}},
            "required": ["text"],
        }),
        annotations: None,
    }
}

fn add_tool() -> Tool {
    Tool {
        name: "add".into(),
        description: "adds two integers".into(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "a": {"type": "integer"},
                "b": {"type": "integer"},
            },
            "required": ["a", "b"],
        }),
        annotations: None,
    }
}

fn initialize_request(id: i64) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-03-26",
            "clientInfo": {"name": "c", "version": "0"},
        },
    })
}

/// Scenario 1: initialize then list tools.
#[tokio::test]
async fn initialize_then_list_tools() {
    let server = Server::new(ServerConfig::default());
    server
        .register_tool(
            echo_tool(),
            Arc::new(|args: serde_json::Value, _session| {
                async move { Ok(HandlerOutput::from(args["text"].as_str().unwrap_or("").to_string())) }.boxed()
            }),
        )
        .unwrap();

    let session = new_session();

    let init_resp = expect_response(&server, &session, initialize_request(1)).await;
    assert_eq!(init_resp["result"]["capabilities"]["tools"]["listChanged"], json!(false));

    let list_resp = expect_response(&server, &session, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
    assert_eq!(list_resp["result"]["tools"][0]["name"], json!("echo"));
}

/// Scenario 2: calling a tool with invalid arguments reports both the
/// missing and the mistyped field.
#[tokio::test]
async fn call_tool_with_invalid_args_reports_missing_and_wrong_type() {
    let server = Server::new(ServerConfig::default());
    server
        .register_tool(
            add_tool(),
            Arc::new(|_args: serde_json::Value, _session| async move { Ok(HandlerOutput::from("6")) }.boxed()),
        )
        .unwrap();

    let session = new_session();
    expect_response(&server, &session, initialize_request(1)).await;

    let resp = expect_response(
        &server,
        &session,
        json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": {"name": "add", "arguments": {"a": "x"}},
        }),
    )
    .await;

    assert_eq!(resp["error"]["code"], json!(-32602));
    let data = &resp["error"]["data"];
    let errors = data["errors"].as_array().expect("errors array");
    let joined: String = errors.iter().map(|e| e["path"].as_str().unwrap_or("")).collect::<Vec<_>>().join(",");
    assert!(joined.contains('a') || errors.iter().any(|e| e["message"].as_str().unwrap_or("").contains('a')));
    assert!(!errors.is_empty());
}

/// Scenario 3: reading an unregistered resource yields NotFound with the
/// uri in the error details.
#[tokio::test]
async fn read_unknown_resource_reports_not_found_with_uri() {
    let server = Server::new(ServerConfig::default());
    let session = new_session();
    expect_response(&server, &session, initialize_request(1)).await;

    let resp = expect_response(
        &server,
        &session,
        json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "resources/read",
            "params": {"uri": "file:///missing.txt"},
        }),
    )
    .await;

    assert_eq!(resp["error"]["code"], json!(-32001));
    assert_eq!(resp["error"]["data"]["details"], json!("file:///missing.txt"));
}

/// A registered resource round-trips through `resources/read` and its
/// handler output is converted to a content item carrying the resource's
/// own mime type and uri.
#[tokio::test]
async fn read_registered_resource_round_trips_content() {
    let server = Server::new(ServerConfig::default());
    server
        .register_resource(
            Resource {
                uri: "file:///hello.txt".into(),
                name: "hello".into(),
                description: None,
                mime_type: Some("text/plain".into()),
            },
            Arc::new(|_session| async move { Ok(HandlerOutput::from("hello world")) }.boxed()),
        )
        .unwrap();

    let session = new_session();
    expect_response(&server, &session, initialize_request(1)).await;

    let resp = expect_response(
        &server,
        &session,
        json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "resources/read",
            "params": {"uri": "file:///hello.txt"},
        }),
    )
    .await;

    let contents = resp["result"]["contents"].as_array().unwrap();
    assert_eq!(contents[0]["text"], json!("hello world"));
    assert_eq!(contents[0]["uri"], json!("file:///hello.txt"));
}

/// A prompt with a required argument rejects a call missing it, and
/// succeeds once supplied.
#[tokio::test]
async fn prompt_get_validates_required_arguments() {
    let server = Server::new(ServerConfig::default());
    server
        .register_prompt(
            Prompt {
                name: "greet".into(),
                description: None,
                arguments: vec![PromptArgument { name: "name".into(), description: None, required: true }],
            },
            Arc::new(|args: std::collections::HashMap<String, serde_json::Value>, _session| {
                async move {
                    let who = args.get("name").and_then(|v| v.as_str()).unwrap_or("world").to_string();
                    Ok::<PromptResult, Box<mcpkit_protocol::McpError>>(PromptResult {
                        messages: vec![PromptMessage {
                            role: "user".into(),
                            content: mcpkit_types::ContentBlock::text(format!("hello, {who}"), "text/plain"),
                        }],
                        description: None,
                        meta: Default::default(),
                    })
                }
                .boxed()
            }),
        )
        .unwrap();

    let session = new_session();
    expect_response(&server, &session, initialize_request(1)).await;

    let missing = expect_response(
        &server,
        &session,
        json!({"jsonrpc": "2.0", "id": 5, "method": "prompts/get", "params": {"name": "greet", "arguments": {}}}),
    )
    .await;
    assert_eq!(missing["error"]["code"], json!(-32602));

    let ok = expect_response(
        &server,
        &session,
        json!({
            "jsonrpc": "2.0",
            "id": 6,
            "method": "prompts/get",
            "params": {"name": "greet", "arguments": {"name": "ada"}},
        }),
    )
    .await;
    assert_eq!(ok["result"]["messages"][0]["content"]["text"], json!("hello, ada"));
}

/// `*/list` called twice in succession returns the same set and clears the
/// list-changed flag after the first call.
#[tokio::test]
async fn list_tools_twice_is_stable_and_clears_the_flag() {
    let server = Server::new(ServerConfig::default());
    server
        .register_tool(
            echo_tool(),
            Arc::new(|_args: serde_json::Value, _session| async move { Ok(HandlerOutput::from("ok")) }.boxed()),
        )
        .unwrap();
    let session = new_session();
    expect_response(&server, &session, initialize_request(1)).await;

    let first = expect_response(&server, &session, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
    let second = expect_response(&server, &session, json!({"jsonrpc": "2.0", "id": 3, "method": "tools/list"})).await;
    assert_eq!(first["result"]["tools"], second["result"]["tools"]);
}

fn trivial_tool_handler() -> mcpkit_server::ToolHandler {
    Arc::new(|_args: serde_json::Value, _session| -> futures::future::BoxFuture<'static, Result<HandlerOutput>> {
        Box::pin(async move { Ok(HandlerOutput::from("ok")) })
    })
}

/// A registration error (duplicate name) surfaces from `register_tool`
/// itself, before any request reaches the dispatcher.
#[test]
fn duplicate_tool_registration_is_idempotent_failure() {
    let server = Server::new(ServerConfig::default());
    server.register_tool(echo_tool(), trivial_tool_handler()).unwrap();
    let err = server.register_tool(echo_tool(), trivial_tool_handler()).unwrap_err();
    assert_eq!(err.kind, mcpkit_protocol::ErrorKind::Server);
}
