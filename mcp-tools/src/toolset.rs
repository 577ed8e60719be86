//! Named collection of read and write operations.

use std::collections::HashSet;

use mcp_primitives::{Method, MethodRegistry};

use crate::error::{GroupError, GroupResult};
use crate::operation::Operation;

/// Named, described collection of operations split into read and write sets.
///
/// Built by value: every builder call consumes and returns the toolset, so no
/// two toolsets can share operation lists.
#[derive(Clone, Debug)]
pub struct Toolset {
    name: String,
    description: String,
    read_tools: Vec<Operation>,
    write_tools: Vec<Operation>,
}

impl Toolset {
    /// Creates an empty toolset.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            read_tools: Vec::new(),
            write_tools: Vec::new(),
        }
    }

    /// Appends side-effect free operations.
    #[must_use]
    pub fn add_read_tools(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.read_tools.extend(operations);
        self
    }

    /// Appends mutating operations, including deletes.
    #[must_use]
    pub fn add_write_tools(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.write_tools.extend(operations);
        self
    }

    /// Returns the toolset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the toolset description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the read operations in insertion order.
    #[must_use]
    pub fn read_tools(&self) -> &[Operation] {
        &self.read_tools
    }

    /// Returns the write operations in insertion order.
    #[must_use]
    pub fn write_tools(&self) -> &[Operation] {
        &self.write_tools
    }

    /// Returns the methods of every operation, reads first.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.read_tools
            .iter()
            .chain(&self.write_tools)
            .map(Operation::method)
    }

    /// Reports whether any operation in the toolset uses `method`.
    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.methods().any(|candidate| candidate.as_str() == method)
    }

    /// Checks that every method is registered and appears at most once.
    ///
    /// # Errors
    ///
    /// Returns every [`GroupError::UnregisteredMethod`] and
    /// [`GroupError::DuplicateOperation`] found, collapsed into
    /// [`GroupError::Invalid`] when there is more than one.
    pub fn validate(&self, registry: &MethodRegistry) -> GroupResult<()> {
        let mut seen = HashSet::new();
        let mut errors = Vec::new();

        for method in self.methods() {
            if !registry.is_registered(method.as_str()) {
                errors.push(GroupError::UnregisteredMethod {
                    toolset: self.name.clone(),
                    method: method.to_string(),
                });
            }
            if !seen.insert(method) {
                errors.push(GroupError::DuplicateOperation {
                    toolset: self.name.clone(),
                    method: method.to_string(),
                });
            }
        }

        GroupError::collect(errors)
    }
}

#[cfg(test)]
mod tests {
    use mcp_binder::ArgumentBag;
    use serde_json::json;

    use super::*;
    use crate::tool::ToolOutput;

    fn op(registry: &mut MethodRegistry, id: &str) -> Operation {
        let method = registry
            .register(id)
            .or_else(|_| Method::new(id))
            .unwrap();
        Operation::new(method, id, json!({ "type": "object" }), |_: ArgumentBag| async {
            Ok(ToolOutput::text("ok"))
        })
    }

    #[test]
    fn builder_chains_read_and_write_sets() {
        let mut registry = MethodRegistry::new();
        let toolset = Toolset::new("tickets", "Desk tickets")
            .add_read_tools([op(&mut registry, "twdesk-list_tickets")])
            .add_write_tools([
                op(&mut registry, "twdesk-create_ticket"),
                op(&mut registry, "twdesk-delete_ticket").destructive(),
            ]);

        assert_eq!(toolset.read_tools().len(), 1);
        assert_eq!(toolset.write_tools().len(), 2);
        assert!(toolset.contains("twdesk-create_ticket"));
        assert!(!toolset.contains("twdesk-get_ticket"));
        assert!(toolset.write_tools()[1].is_destructive());
        toolset.validate(&registry).unwrap();
    }

    #[test]
    fn duplicate_across_read_and_write_is_rejected() {
        let mut registry = MethodRegistry::new();
        let toolset = Toolset::new("tickets", "")
            .add_read_tools([op(&mut registry, "twdesk-get_ticket")])
            .add_write_tools([op(&mut registry, "twdesk-get_ticket")]);

        assert_eq!(
            toolset.validate(&registry),
            Err(GroupError::DuplicateOperation {
                toolset: "tickets".into(),
                method: "twdesk-get_ticket".into(),
            })
        );
    }

    #[test]
    fn unregistered_methods_are_all_reported() {
        let registry = MethodRegistry::new();
        let toolset = Toolset::new("tasks", "").add_read_tools([
            Operation::new(
                Method::new("twprojects-list_tasks").unwrap(),
                "",
                json!({}),
                |_: ArgumentBag| async { Ok(ToolOutput::text("")) },
            ),
            Operation::new(
                Method::new("twprojects-get_task").unwrap(),
                "",
                json!({}),
                |_: ArgumentBag| async { Ok(ToolOutput::text("")) },
            ),
        ]);

        let err = toolset.validate(&registry).expect_err("nothing registered");
        assert!(matches!(err, GroupError::Invalid(errors) if errors.len() == 2));
    }
}
