//! Tool plumbing shared by every integration surface.
//!
//! Integration packages describe their operations as [`Operation`]s, group
//! them into [`Toolset`]s, and collect the toolsets of one surface in a
//! [`ToolsetGroup`]. Startup configuration then resolves which toolsets are
//! enabled, and [`ToolsetGroup::register_all`] hands the exposed operations to
//! a [`ToolSink`] such as the [`ToolRegistry`] used by the serving layer.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod group;
mod operation;
mod registry;
mod tool;
mod toolset;

pub use error::{GroupError, GroupResult, ToolError, ToolResult};
pub use group::{Enablement, ToolsetGroup, enable_groups};
pub use operation::{Operation, ToolAccess};
pub use registry::{ToolAnnotations, ToolDescriptor, ToolEntry, ToolRegistry, ToolSink};
pub use tool::{Tool, ToolOutput};
pub use toolset::Toolset;
