//! Frozen table of exposed tools consulted by the serving layer.

use std::collections::HashMap;

use mcp_binder::ArgumentBag;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ToolError, ToolResult};
use crate::operation::{Operation, ToolAccess};
use crate::tool::ToolOutput;

/// Receiver of exposed operations, implemented by serving layers.
pub trait ToolSink {
    /// Accepts one exposed operation.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicateTool`] when the method name is taken.
    fn add_tool(&mut self, operation: Operation, access: ToolAccess) -> ToolResult<()>;
}

/// Behaviour hints advertised alongside a tool.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    /// The tool never modifies remote state.
    pub read_only_hint: bool,
    /// The tool may remove remote state.
    pub destructive_hint: bool,
}

/// Listing entry for one tool, in the shape clients expect.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Method identifier used as the tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Opaque JSON schema of the arguments.
    pub input_schema: Value,
    /// Behaviour hints.
    pub annotations: ToolAnnotations,
}

/// One registered tool.
#[derive(Clone, Debug)]
pub struct ToolEntry {
    operation: Operation,
    access: ToolAccess,
}

impl ToolEntry {
    /// Returns the underlying operation.
    #[must_use]
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Returns whether the tool came from a read or write set.
    #[must_use]
    pub fn access(&self) -> ToolAccess {
        self.access
    }

    /// Builds the listing entry.
    #[must_use]
    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.operation.method().to_string(),
            description: self.operation.description().to_owned(),
            input_schema: self.operation.input_schema().clone(),
            annotations: ToolAnnotations {
                read_only_hint: self.access == ToolAccess::Read,
                destructive_hint: self.operation.is_destructive(),
            },
        }
    }
}

/// Registry of exposed tools keyed by method name, in registration order.
///
/// Filled during startup through [`ToolSink`], then shared immutably.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    entries: Vec<ToolEntry>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.index.get(name).map(|&position| &self.entries[position])
    }

    /// Lists every tool in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.entries.iter().map(ToolEntry::descriptor).collect()
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Invokes a tool with the JSON `arguments` of a call.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] for unregistered names,
    /// [`ToolError::InvalidParams`] when the arguments are not an object, and
    /// otherwise whatever the handler returns.
    pub async fn invoke(&self, name: &str, arguments: Value) -> ToolResult<ToolOutput> {
        let entry = self.get(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_owned(),
        })?;
        let args = ArgumentBag::from_json(arguments)
            .map_err(|err| ToolError::InvalidParams(err.into()))?;

        debug!(tool = name, arguments = args.len(), "invoking tool");
        let result = entry.operation.handler().invoke(args).await;
        match &result {
            Err(ToolError::InvalidParams(errors)) => {
                debug!(tool = name, %errors, "tool arguments rejected");
            }
            Err(err) => warn!(tool = name, error = %err, "tool call failed"),
            Ok(_) => {}
        }
        result
    }
}

impl ToolSink for ToolRegistry {
    fn add_tool(&mut self, operation: Operation, access: ToolAccess) -> ToolResult<()> {
        let name = operation.method().to_string();
        if self.index.contains_key(&name) {
            return Err(ToolError::DuplicateTool { name });
        }

        debug!(tool = %name, ?access, "tool registered");
        self.index.insert(name, self.entries.len());
        self.entries.push(ToolEntry { operation, access });
        Ok(())
    }
}
