// Copyright 2026
// SPDX-License-Identifier: Apache-2.0

use crate::tools::echo;
use rmcp::ErrorData as McpError;
use rmcp::{
    ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, Implementation, InitializeResult, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    schemars, tool, tool_handler, tool_router,
};
use serde::Deserialize;

/// Demo tools. Never exposed directly: the router wraps it in
/// [`crate::guard::RedactingServer`].
#[derive(Clone)]
pub struct PiiDemoServer {
    tool_router: ToolRouter<Self>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct InputParameters {
    #[schemars(description = "Free text, possibly containing PII")]
    pub input: String,
}

#[tool_router]
impl PiiDemoServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Echo the input back as {\"result\": input}")]
    async fn demo_echo(
        &self,
        Parameters(InputParameters { input }): Parameters<InputParameters>,
    ) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::structured(echo::echo_payload(&input)))
    }

    #[tool(description = "Return the input unchanged as text")]
    async fn orchestrator_tool(
        &self,
        Parameters(InputParameters { input }): Parameters<InputParameters>,
    ) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(echo::orchestrate(
            input,
        ))]))
    }
}

impl Default for PiiDemoServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_handler]
impl ServerHandler for PiiDemoServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Demo tools behind a PII redaction guard. Arguments are scrubbed before a tool \
                 runs and results are scrubbed before they are returned.

        The available actions are:
        - demo_echo: Echo the input back as {\"result\": input}
        - orchestrator_tool: Return the input unchanged as text
        "
                .to_string(),
            ),
        }
    }

    async fn initialize(
        &self,
        _request: rmcp::model::InitializeRequestParam,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<InitializeResult, McpError> {
        Ok(self.get_info())
    }
}
