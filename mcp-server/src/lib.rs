//! Startup wiring for the Teamwork MCP server.
//!
//! [`bootstrap`] turns a validated [`ServerConfig`] and an [`ApiClient`] into
//! the frozen [`ToolRegistry`] served by [`mcp_kernel::McpServer`].

#![warn(missing_docs, clippy::pedantic)]

use std::sync::Arc;

use anyhow::Context;
use mcp_config::ServerConfig;
use mcp_primitives::MethodRegistry;
use mcp_teamwork::{ApiClient, desk, projects};
use mcp_tools::{Enablement, ToolRegistry, enable_groups};
use tracing::info;

/// Outcome of startup.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    tools: Arc<ToolRegistry>,
    has_tools: bool,
}

impl Bootstrap {
    /// Returns the registry of exposed tools.
    #[must_use]
    pub fn tools(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.tools)
    }

    /// Reports whether any tool is exposed at all.
    #[must_use]
    pub fn has_tools(&self) -> bool {
        self.has_tools
    }
}

/// Declares every method, builds both surfaces, resolves the configured
/// toolsets, and registers the exposed tools.
///
/// # Errors
///
/// Fails when a method is declared twice, a toolset is malformed, or the
/// configured toolsets name something no surface provides.
pub fn bootstrap(config: &ServerConfig, client: Arc<dyn ApiClient>) -> anyhow::Result<Bootstrap> {
    let mut registry = MethodRegistry::new();
    let desk_methods =
        desk::register_methods(&mut registry).context("failed to declare desk methods")?;
    let projects_methods =
        projects::register_methods(&mut registry).context("failed to declare projects methods")?;

    let policy = config.access_policy();
    let mut groups = [
        desk::toolset_group(&registry, &desk_methods, &client, &policy)
            .context("failed to build desk toolsets")?,
        projects::toolset_group(&registry, &projects_methods, &client, &policy)
            .context("failed to build projects toolsets")?,
    ];

    enable_groups(&mut groups, &Enablement::from_tokens(&config.toolsets))
        .context("invalid toolset selection")?;

    let mut tools = ToolRegistry::new();
    for (surface, group) in [desk::SURFACE, projects::SURFACE].into_iter().zip(&groups) {
        let count = group
            .register_all(&mut tools)
            .with_context(|| format!("failed to register {surface} tools"))?;
        info!(surface, count, "surface registered");
    }

    let has_tools = groups.iter().any(mcp_tools::ToolsetGroup::has_tools);
    info!(
        methods = registry.len(),
        exposed = tools.len(),
        read_only = policy.read_only(),
        allow_delete = policy.allow_delete(),
        "tools registered"
    );

    Ok(Bootstrap {
        tools: Arc::new(tools),
        has_tools,
    })
}
