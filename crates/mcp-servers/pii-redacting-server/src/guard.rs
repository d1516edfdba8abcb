// Copyright 2026
// SPDX-License-Identifier: Apache-2.0
//
// Redaction guard for any rmcp ServerHandler.
//
// Every tools/call goes through the interceptor. Tool arguments are the only
// inbound data redacted; the request id, `_meta` and the rest of the request
// context reach the inner handler untouched.

use pii_redaction::{
    CallEnvelope, CallError, CallMetadata, Interceptor, Redactable, RedactionEngine, RedactionError,
};
use rmcp::ErrorData as McpError;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, InitializeRequestParam, InitializeResult, ListToolsResult,
    PaginatedRequestParam, RawContent, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};
use serde_json::Value;

/// Wraps `inner` so that its tool calls are redacted in both directions.
#[derive(Clone)]
pub struct RedactingServer<S> {
    inner: S,
    interceptor: Interceptor,
}

impl<S: ServerHandler> RedactingServer<S> {
    pub fn new(inner: S, interceptor: Interceptor) -> Self {
        Self { inner, interceptor }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

/// A tool result on its way back to the caller.
#[derive(Debug, Clone)]
pub struct ToolOutput(pub CallToolResult);

impl Redactable for ToolOutput {
    /// Text blocks and structured content are redacted. Other block kinds
    /// cannot be inspected, so they reject the result.
    fn redact_with(&mut self, engine: &RedactionEngine) -> Result<(), RedactionError> {
        for block in self.0.content.iter_mut() {
            match &mut block.raw {
                RawContent::Text(text) => engine.redact_string(&mut text.text)?,
                _ => {
                    return Err(RedactionError::Schema {
                        kind: "non-text content block",
                    });
                }
            }
        }
        if let Some(structured) = self.0.structured_content.as_mut() {
            engine.redact_value(structured)?;
        }
        Ok(())
    }

    fn string_weight(&self) -> usize {
        let text: usize = self
            .0
            .content
            .iter()
            .map(|block| match &block.raw {
                RawContent::Text(text) => text.text.len(),
                _ => 0,
            })
            .sum();
        text + self
            .0
            .structured_content
            .as_ref()
            .map_or(0, pii_redaction::engine::string_weight)
    }
}

/// Maps an interceptor outcome onto the JSON-RPC error returned to the
/// client. Downstream errors are returned exactly as the tool produced them.
pub fn into_mcp_error(err: CallError<McpError>) -> McpError {
    match err {
        CallError::Downstream(err) => err,
        CallError::Rejected(err) if err.is_structural() => {
            McpError::invalid_params(err.public_message(), None)
        }
        CallError::Rejected(err) => McpError::internal_error(err.public_message(), None),
        CallError::Cancelled => McpError::internal_error("request cancelled", None),
    }
}

impl<S: ServerHandler> ServerHandler for RedactingServer<S> {
    fn get_info(&self) -> ServerInfo {
        self.inner.get_info()
    }

    async fn initialize(
        &self,
        request: InitializeRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, McpError> {
        self.inner.initialize(request, context).await
    }

    async fn list_tools(
        &self,
        request: Option<PaginatedRequestParam>,
        context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        self.inner.list_tools(request, context).await
    }

    async fn call_tool(
        &self,
        mut request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let envelope = CallEnvelope {
            metadata: CallMetadata {
                request_id: serde_json::to_value(&context.id).ok(),
                tool: request.name.to_string(),
                meta: None,
            },
            params: request
                .arguments
                .take()
                .map(Value::Object)
                .unwrap_or(Value::Null),
        };
        let cancel = context.ct.clone();
        let inner = &self.inner;

        let outcome = self
            .interceptor
            .intercept(envelope, &cancel, move |call| {
                request.arguments = match call.params {
                    Value::Object(arguments) => Some(arguments),
                    _ => None,
                };
                async move { inner.call_tool(request, context).await.map(ToolOutput) }
            })
            .await;

        outcome.map(|output| output.0).map_err(into_mcp_error)
    }
}
