//! Teamwork Desk surface (`twdesk-*` methods): tickets and customers.

mod customers;
mod tickets;

use std::sync::Arc;

use mcp_policy::AccessPolicy;
use mcp_primitives::{Method, MethodRegistry};
use mcp_tools::{GroupResult, ToolsetGroup};

use crate::client::ApiClient;

/// Method prefix shared by every Desk tool.
pub const SURFACE: &str = "twdesk";

/// Methods declared by the Desk surface.
#[derive(Debug, Clone)]
pub struct DeskMethods {
    list_tickets: Method,
    get_ticket: Method,
    create_ticket: Method,
    update_ticket: Method,
    delete_ticket: Method,
    list_customers: Method,
    get_customer: Method,
    create_customer: Method,
    delete_customer: Method,
}

/// Declares every Desk method in `registry`.
///
/// # Errors
///
/// Fails when any Desk method was already declared.
pub fn register_methods(registry: &mut MethodRegistry) -> mcp_primitives::Result<DeskMethods> {
    Ok(DeskMethods {
        list_tickets: registry.register("twdesk-list_tickets")?,
        get_ticket: registry.register("twdesk-get_ticket")?,
        create_ticket: registry.register("twdesk-create_ticket")?,
        update_ticket: registry.register("twdesk-update_ticket")?,
        delete_ticket: registry.register("twdesk-delete_ticket")?,
        list_customers: registry.register("twdesk-list_customers")?,
        get_customer: registry.register("twdesk-get_customer")?,
        create_customer: registry.register("twdesk-create_customer")?,
        delete_customer: registry.register("twdesk-delete_customer")?,
    })
}

/// Builds the Desk toolset group.
///
/// Delete tools are only added when `policy` allows deletes; the group itself
/// applies the read-only switch.
///
/// # Errors
///
/// Propagates toolset validation failures.
pub fn toolset_group(
    registry: &MethodRegistry,
    methods: &DeskMethods,
    client: &Arc<dyn ApiClient>,
    policy: &AccessPolicy,
) -> GroupResult<ToolsetGroup> {
    let mut group = ToolsetGroup::new(policy.read_only());
    group.add_toolset(tickets::toolset(methods, client, policy), registry)?;
    group.add_toolset(customers::toolset(methods, client, policy), registry)?;
    Ok(group)
}
