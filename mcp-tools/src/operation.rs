//! A single exposable operation: method, schema, and handler.

use std::fmt;
use std::sync::Arc;

use mcp_primitives::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tool::Tool;

/// Whether an exposed operation came from a read or a write set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolAccess {
    /// No side effects.
    Read,
    /// Creates, updates, or deletes remote state.
    Write,
}

/// One exposable unit: `(method, handler, schema)` plus a description.
///
/// Cloning is cheap; the handler is shared.
#[derive(Clone)]
pub struct Operation {
    method: Method,
    description: String,
    input_schema: Value,
    handler: Arc<dyn Tool>,
    destructive: bool,
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("method", &self.method)
            .field("destructive", &self.destructive)
            .finish_non_exhaustive()
    }
}

impl Operation {
    /// Creates an operation. The schema is passed through to clients untouched.
    #[must_use]
    pub fn new<T>(
        method: Method,
        description: impl Into<String>,
        input_schema: Value,
        handler: T,
    ) -> Self
    where
        T: Tool + 'static,
    {
        Self {
            method,
            description: description.into(),
            input_schema,
            handler: Arc::new(handler),
            destructive: false,
        }
    }

    /// Marks the operation as removing remote state.
    #[must_use]
    pub fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }

    /// Returns the method identifier.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the opaque input schema.
    #[must_use]
    pub fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Returns the shared handler.
    #[must_use]
    pub fn handler(&self) -> Arc<dyn Tool> {
        Arc::clone(&self.handler)
    }

    /// Returns true for operations marked with [`destructive`](Self::destructive).
    #[must_use]
    pub fn is_destructive(&self) -> bool {
        self.destructive
    }
}
