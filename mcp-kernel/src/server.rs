//! Tool discovery and invocation behind the rmcp server handler.

use std::sync::Arc;

use mcp_tools::{ToolDescriptor, ToolError, ToolRegistry};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, ErrorData, Implementation, JsonObject,
    ListToolsResult, PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler, model};
use serde_json::Value;
use tracing::{debug, warn};

use crate::scheduler::TaskScheduler;

/// Answers client requests against a frozen [`ToolRegistry`].
///
/// Every tool call runs on the [`TaskScheduler`], so the number of calls in
/// flight is bounded no matter how many requests the session accepts.
#[derive(Debug, Clone)]
pub struct McpServer {
    tools: Arc<ToolRegistry>,
    info: Implementation,
    scheduler: TaskScheduler,
}

impl McpServer {
    /// Creates a server over the exposed tools.
    #[must_use]
    pub fn new(tools: Arc<ToolRegistry>, info: Implementation, scheduler: TaskScheduler) -> Self {
        Self {
            tools,
            info,
            scheduler,
        }
    }

    /// Returns the exposed tools.
    #[must_use]
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Returns true when the tool capability is advertised.
    #[must_use]
    pub fn has_tools(&self) -> bool {
        !self.tools.is_empty()
    }

    /// Lists the exposed tools in registration order.
    #[must_use]
    pub fn listed_tools(&self) -> Vec<Tool> {
        self.tools.list().into_iter().map(to_tool).collect()
    }

    /// Runs one tool call to completion.
    ///
    /// Argument and downstream 4xx failures come back as `isError` results so
    /// the caller can correct the call.
    ///
    /// # Errors
    ///
    /// Returns `-32602` for names that are not exposed and `-32603` for
    /// execution failures, a closed scheduler, or a panicking handler.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ErrorData> {
        let tools = Arc::clone(&self.tools);
        let tool = name.to_owned();
        let arguments = arguments.map_or(Value::Null, Value::Object);
        let handle = self
            .scheduler
            .spawn(async move { tools.invoke(&tool, arguments).await })
            .await
            .map_err(|err| ErrorData::internal_error(err.to_string(), None))?;

        let outcome = handle.await.map_err(|err| {
            warn!(tool = name, error = %err, "tool call did not complete");
            ErrorData::internal_error(format!("tool `{name}` did not complete"), None)
        })?;

        match outcome {
            Ok(output) => {
                let content = vec![Content::text(output.as_text())];
                Ok(if output.is_error() {
                    CallToolResult::error(content)
                } else {
                    CallToolResult::success(content)
                })
            }
            Err(err) if err.is_tool_failure() => {
                Ok(CallToolResult::error(vec![Content::text(err.to_string())]))
            }
            Err(err @ ToolError::UnknownTool { .. }) => {
                Err(ErrorData::invalid_params(err.to_string(), None))
            }
            Err(err) => {
                warn!(tool = name, error = %err, "tool call aborted");
                Err(ErrorData::internal_error(err.to_string(), None))
            }
        }
    }
}

fn to_tool(descriptor: ToolDescriptor) -> Tool {
    let schema = match descriptor.input_schema {
        Value::Object(schema) => schema,
        _ => JsonObject::new(),
    };
    let mut tool = Tool::new(descriptor.name, descriptor.description, Arc::new(schema));
    tool.annotations = Some(model::ToolAnnotations {
        read_only_hint: Some(descriptor.annotations.read_only_hint),
        destructive_hint: Some(descriptor.annotations.destructive_hint),
        ..Default::default()
    });
    tool
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        let capabilities = if self.has_tools() {
            ServerCapabilities::builder().enable_tools().build()
        } else {
            ServerCapabilities::default()
        };
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities,
            server_info: self.info.clone(),
            instructions: None,
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let tools = self.listed_tools();
        debug!(count = tools.len(), "tools listed");
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        debug!(tool = %request.name, "tool call received");
        self.call(&request.name, request.arguments).await
    }
}
