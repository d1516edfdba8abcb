// Copyright 2026
// SPDX-License-Identifier: Apache-2.0
//
// RedactingServer::call_tool driven by a real rmcp client over an in-memory
// pipe, with a recording handler behind the guard.

use pii_redacting_server::guard::RedactingServer;
use pii_redaction::{Interceptor, NoopObserver, RedactionConfig};
use rmcp::ErrorData as McpError;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, ErrorCode, Implementation, JsonObject,
    ProtocolVersion, RequestId, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RunningService, ServiceError};
use rmcp::{RoleClient, RoleServer, ServerHandler, ServiceExt};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Seen {
    tool: String,
    arguments: Option<JsonObject>,
    request_id: RequestId,
    cancelled: bool,
}

/// Records what reaches it and echoes the arguments back next to an
/// address of its own.
#[derive(Clone, Default)]
struct Recorder {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Recorder {
    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

impl ServerHandler for Recorder {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: None,
        }
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.seen.lock().unwrap().push(Seen {
            tool: request.name.to_string(),
            arguments: request.arguments.clone(),
            request_id: context.id.clone(),
            cancelled: context.ct.is_cancelled(),
        });
        if request.name == "lookup_missing" {
            return Err(McpError::invalid_params("no record for bob@example.com", None));
        }
        let echoed = serde_json::to_string(&request.arguments).unwrap();
        Ok(CallToolResult::success(vec![Content::text(format!(
            "{echoed} owner ops@example.com"
        ))]))
    }
}

async fn connect(recorder: Recorder, config: RedactionConfig) -> RunningService<RoleClient, ()> {
    let interceptor = Interceptor::from_config(&config, Arc::new(NoopObserver)).unwrap();
    let (server_io, client_io) = tokio::io::duplex(64 * 1024);
    tokio::spawn(async move {
        let server = RedactingServer::new(recorder, interceptor)
            .serve(server_io)
            .await
            .unwrap();
        let _ = server.waiting().await;
    });
    ().serve(client_io).await.unwrap()
}

fn request(tool: &str, arguments: Value) -> CallToolRequestParam {
    serde_json::from_value(json!({ "name": tool, "arguments": arguments })).unwrap()
}

fn text_of(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| c.as_text().map(|t| t.text.clone()))
        .collect()
}

#[tokio::test]
async fn test_inner_handler_receives_redacted_arguments() {
    let recorder = Recorder::default();
    let client = connect(recorder.clone(), RedactionConfig::default()).await;

    let result = client
        .call_tool(request(
            "lookup",
            json!({"email": "ann@corp.example.com", "limit": 5, "nested": {"ssn": "123-45-6789"}}),
        ))
        .await
        .unwrap();

    let seen = recorder.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].tool, "lookup");
    assert!(!seen[0].cancelled);
    let expected = json!({
        "email": "<EMAIL_ADDRESS>",
        "limit": 5,
        "nested": {"ssn": "<US_SOCIAL_SECURITY_NUMBER>"},
    });
    assert_eq!(seen[0].arguments.clone().map(Value::Object), Some(expected));

    let text = text_of(&result);
    assert!(!text.contains("ann@corp.example.com"), "{text}");
    assert!(!text.contains("ops@example.com"), "{text}");
    assert!(text.ends_with("owner <EMAIL_ADDRESS>"), "{text}");

    client.cancel().await.unwrap();
}

#[tokio::test]
async fn test_each_call_keeps_its_own_request_context() {
    let recorder = Recorder::default();
    let client = connect(recorder.clone(), RedactionConfig::default()).await;

    client.call_tool(request("first", json!({}))).await.unwrap();
    client.call_tool(request("second", json!({"q": "plain"}))).await.unwrap();

    let seen = recorder.seen();
    let tools: Vec<&str> = seen.iter().map(|s| s.tool.as_str()).collect();
    assert_eq!(tools, vec!["first", "second"]);
    assert_ne!(seen[0].request_id, seen[1].request_id);
    assert_eq!(seen[1].arguments.clone().map(Value::Object), Some(json!({"q": "plain"})));

    client.cancel().await.unwrap();
}

#[tokio::test]
async fn test_downstream_error_reaches_client_unchanged() {
    let recorder = Recorder::default();
    let client = connect(recorder.clone(), RedactionConfig::default()).await;

    let err = client
        .call_tool(request("lookup_missing", json!({"email": "bob@example.com"})))
        .await
        .unwrap_err();
    match err {
        ServiceError::McpError(data) => {
            assert_eq!(data.code, ErrorCode::INVALID_PARAMS);
            assert_eq!(data.message, "no record for bob@example.com");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // the handler itself only ever saw the placeholder
    assert_eq!(
        recorder.seen()[0].arguments.clone().map(Value::Object),
        Some(json!({"email": "<EMAIL_ADDRESS>"}))
    );

    client.cancel().await.unwrap();
}

#[tokio::test]
async fn test_too_deep_arguments_never_reach_handler() {
    let recorder = Recorder::default();
    let config = RedactionConfig {
        max_recursion_depth: 2,
        ..RedactionConfig::default()
    };
    let client = connect(recorder.clone(), config).await;

    let err = client
        .call_tool(request("lookup", json!({"a": {"b": {"c": "x@y.io"}}})))
        .await
        .unwrap_err();
    match err {
        ServiceError::McpError(data) => {
            assert_eq!(data.code, ErrorCode::INVALID_PARAMS);
            assert_eq!(data.message, "payload failed structural validation");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(recorder.seen().is_empty());

    client.cancel().await.unwrap();
}
