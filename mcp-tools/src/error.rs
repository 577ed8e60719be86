//! Errors produced while building toolsets and invoking tools.

use mcp_binder::BindErrors;
use thiserror::Error;

/// Result alias for tool registration and invocation.
pub type ToolResult<T> = Result<T, ToolError>;

/// Result alias for toolset composition and enablement.
pub type GroupResult<T> = Result<T, GroupError>;

/// Errors produced by tool registration and invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The call arguments could not be bound to the request type.
    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] BindErrors),

    /// The remote API refused the request (4xx class).
    #[error("request rejected ({status}): {reason}")]
    Rejected {
        /// Status code returned by the remote API.
        status: u16,
        /// Body or message explaining the rejection.
        reason: String,
    },

    /// Tool execution failed for reasons outside the caller's control.
    #[error("tool execution failed: {reason}")]
    Execution {
        /// Human-readable error returned by the tool implementation.
        reason: String,
    },

    /// Requested tool does not exist.
    #[error("tool `{name}` is not registered")]
    UnknownTool {
        /// Name of the missing tool.
        name: String,
    },

    /// Tool name collided with an existing registration.
    #[error("tool `{name}` is already registered")]
    DuplicateTool {
        /// Name of the offending tool.
        name: String,
    },
}

impl ToolError {
    /// Creates an execution error from the supplied reason.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }

    /// Returns true when the failure belongs in a tool result rather than a
    /// protocol error: bad arguments and remote rejections.
    #[must_use]
    pub fn is_tool_failure(&self) -> bool {
        matches!(self, Self::InvalidParams(_) | Self::Rejected { .. })
    }
}

/// Errors raised while composing toolsets or resolving enablement.
///
/// All of them are configuration or programming mistakes and abort startup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GroupError {
    /// An operation references a method missing from the registry.
    #[error("toolset `{toolset}` exposes unregistered method `{method}`")]
    UnregisteredMethod {
        /// Toolset carrying the operation.
        toolset: String,
        /// Offending method identifier.
        method: String,
    },

    /// A method is exposed twice across the read and write sets of a toolset.
    #[error("toolset `{toolset}` exposes method `{method}` more than once")]
    DuplicateOperation {
        /// Toolset carrying the operations.
        toolset: String,
        /// Duplicated method identifier.
        method: String,
    },

    /// Two toolsets with the same name were added to one group.
    #[error("toolset `{name}` is already part of the group")]
    DuplicateToolset {
        /// Name of the duplicated toolset.
        name: String,
    },

    /// Enablement tokens that matched no toolset or method, in request order.
    #[error("unknown toolsets or methods: {}", .0.join(", "))]
    UnknownTokens(Vec<String>),

    /// Several independent problems found in one pass.
    #[error("{}", join(.0))]
    Invalid(Vec<GroupError>),
}

impl GroupError {
    /// Collapses a list of problems into a single error, if there is any.
    pub(crate) fn collect(mut errors: Vec<GroupError>) -> GroupResult<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Self::Invalid(errors)),
        }
    }
}

fn join(errors: &[GroupError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
