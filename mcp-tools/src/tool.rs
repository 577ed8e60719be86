//! Handler seam invoked for every tool call.

use std::future::Future;

use async_trait::async_trait;
use mcp_binder::ArgumentBag;
use serde::Serialize;

use crate::error::{ToolError, ToolResult};

/// Textual result of a tool call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolOutput {
    text: String,
    is_error: bool,
}

impl ToolOutput {
    /// Creates a successful result carrying plain text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    /// Creates a successful result carrying pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Execution`] if `value` cannot be serialised.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> ToolResult<Self> {
        serde_json::to_string_pretty(value)
            .map(Self::text)
            .map_err(|err| ToolError::execution(format!("failed to encode tool output: {err}")))
    }

    /// Creates a result reporting a tool-level failure to the caller.
    #[must_use]
    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    /// Returns the result text.
    #[must_use]
    pub fn as_text(&self) -> &str {
        &self.text
    }

    /// Returns true for tool-level failures.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.is_error
    }
}

/// Trait implemented by tool handlers.
///
/// Each call receives its own [`ArgumentBag`]; handlers keep no per-call state.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Invokes the tool with the call arguments.
    async fn invoke(&self, args: ArgumentBag) -> ToolResult<ToolOutput>;
}

#[async_trait]
impl<F, Fut> Tool for F
where
    F: Send + Sync + Fn(ArgumentBag) -> Fut,
    Fut: Future<Output = ToolResult<ToolOutput>> + Send,
{
    async fn invoke(&self, args: ArgumentBag) -> ToolResult<ToolOutput> {
        (self)(args).await
    }
}
