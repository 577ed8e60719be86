//! Teamwork Projects surface (`twprojects-*` methods): tasks and time logs.

mod tasks;
mod timelogs;

use std::sync::Arc;

use mcp_policy::AccessPolicy;
use mcp_primitives::{Method, MethodRegistry};
use mcp_tools::{GroupResult, ToolsetGroup};

use crate::client::ApiClient;

/// Method prefix shared by every Projects tool.
pub const SURFACE: &str = "twprojects";

/// Methods declared by the Projects surface.
#[derive(Debug, Clone)]
pub struct ProjectsMethods {
    list_tasks: Method,
    get_task: Method,
    create_task: Method,
    update_task: Method,
    delete_task: Method,
    list_timelogs: Method,
    create_timelog: Method,
    delete_timelog: Method,
}

/// Declares every Projects method in `registry`.
///
/// # Errors
///
/// Fails when any Projects method was already declared.
pub fn register_methods(registry: &mut MethodRegistry) -> mcp_primitives::Result<ProjectsMethods> {
    Ok(ProjectsMethods {
        list_tasks: registry.register("twprojects-list_tasks")?,
        get_task: registry.register("twprojects-get_task")?,
        create_task: registry.register("twprojects-create_task")?,
        update_task: registry.register("twprojects-update_task")?,
        delete_task: registry.register("twprojects-delete_task")?,
        list_timelogs: registry.register("twprojects-list_timelogs")?,
        create_timelog: registry.register("twprojects-create_timelog")?,
        delete_timelog: registry.register("twprojects-delete_timelog")?,
    })
}

/// Builds the Projects toolset group.
///
/// # Errors
///
/// Propagates toolset validation failures.
pub fn toolset_group(
    registry: &MethodRegistry,
    methods: &ProjectsMethods,
    client: &Arc<dyn ApiClient>,
    policy: &AccessPolicy,
) -> GroupResult<ToolsetGroup> {
    let mut group = ToolsetGroup::new(policy.read_only());
    group.add_toolset(tasks::toolset(methods, client, policy), registry)?;
    group.add_toolset(timelogs::toolset(methods, client, policy), registry)?;
    Ok(group)
}

#[cfg(test)]
mod tests {
    use mcp_tools::{Enablement, GroupError};

    use super::*;
    use crate::support::testing::RecordingClient;

    fn group(policy: AccessPolicy) -> ToolsetGroup {
        let mut registry = MethodRegistry::new();
        let methods = register_methods(&mut registry).unwrap();
        let client: Arc<dyn ApiClient> = Arc::new(RecordingClient::ok());
        toolset_group(&registry, &methods, &client, &policy).unwrap()
    }

    #[test]
    fn methods_share_the_surface_prefix() {
        let group = group(AccessPolicy::new(false, true));
        let methods: Vec<_> = group
            .toolsets()
            .iter()
            .flat_map(mcp_tools::Toolset::methods)
            .collect();

        assert_eq!(methods.len(), 8);
        assert!(methods.iter().all(|method| method.surface() == Some(SURFACE)));
    }

    #[test]
    fn enabling_a_method_enables_its_toolset() {
        let mut group = group(AccessPolicy::new(false, true));
        group
            .enable_toolsets(&Enablement::from_tokens(["twprojects-create_timelog"]))
            .unwrap();

        assert!(group.is_enabled("timelogs"));
        assert!(!group.is_enabled("tasks"));
        let names: Vec<_> = group
            .exposed()
            .map(|(operation, _)| operation.method().as_str())
            .collect();
        assert_eq!(
            names,
            [
                "twprojects-list_timelogs",
                "twprojects-create_timelog",
                "twprojects-delete_timelog"
            ]
        );
    }

    #[test]
    fn unknown_tokens_leave_group_untouched() {
        let mut group = group(AccessPolicy::default());
        let err = group
            .enable_toolsets(&Enablement::from_tokens(["tasks", "twdesk-list_tickets"]))
            .expect_err("desk methods are not part of this group");

        assert_eq!(
            err,
            GroupError::UnknownTokens(vec!["twdesk-list_tickets".into()])
        );
        assert!(!group.has_tools());
    }
}
