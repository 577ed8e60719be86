//! Enablement resolution across the toolsets of one integration surface.

use std::collections::BTreeSet;

use mcp_primitives::{ALL_METHODS, Method, MethodRegistry};
use tracing::{debug, info};

use crate::error::{GroupError, GroupResult, ToolResult};
use crate::operation::{Operation, ToolAccess};
use crate::registry::ToolSink;
use crate::toolset::Toolset;

/// Which toolsets a server should enable, as requested by configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enablement {
    /// Every toolset of every group.
    All,
    /// Method identifiers or toolset names, in request order.
    Tokens(Vec<String>),
}

impl Enablement {
    /// Parses configuration tokens. Blank tokens are ignored and any `all`
    /// token selects [`Enablement::All`].
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut requested = Vec::new();
        for token in tokens {
            let token = token.as_ref().trim();
            if token == ALL_METHODS {
                return Self::All;
            }
            if !token.is_empty() {
                requested.push(token.to_owned());
            }
        }
        Self::Tokens(requested)
    }
}

/// Enablement changes computed for one group but not yet applied.
#[derive(Debug, Default)]
struct Plan {
    toolsets: BTreeSet<usize>,
    methods: Vec<Method>,
}

/// The toolsets of one integration surface plus their enablement state.
///
/// Built and resolved during startup, then only read.
#[derive(Debug)]
pub struct ToolsetGroup {
    read_only: bool,
    toolsets: Vec<Toolset>,
    enabled: BTreeSet<usize>,
    enabled_methods: BTreeSet<Method>,
}

impl ToolsetGroup {
    /// Creates an empty group. In read-only mode no write operation is exposed.
    #[must_use]
    pub fn new(read_only: bool) -> Self {
        Self {
            read_only,
            toolsets: Vec::new(),
            enabled: BTreeSet::new(),
            enabled_methods: BTreeSet::new(),
        }
    }

    /// Adds a toolset after validating it against the method registry.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::DuplicateToolset`] when the name is taken, or the
    /// validation errors of [`Toolset::validate`].
    pub fn add_toolset(&mut self, toolset: Toolset, registry: &MethodRegistry) -> GroupResult<()> {
        if self.toolsets.iter().any(|existing| existing.name() == toolset.name()) {
            return Err(GroupError::DuplicateToolset {
                name: toolset.name().to_owned(),
            });
        }
        toolset.validate(registry)?;

        debug!(toolset = toolset.name(), "toolset added");
        self.toolsets.push(toolset);
        Ok(())
    }

    /// Resolves an enablement request against this group.
    ///
    /// Tokens may name a method (enabling the toolset that contains it) or a
    /// toolset. Nothing changes unless every token resolves.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::UnknownTokens`] listing every unresolved token.
    pub fn enable_toolsets(&mut self, request: &Enablement) -> GroupResult<()> {
        let (plan, unknown) = self.plan(request);
        if !unknown.is_empty() {
            return Err(GroupError::UnknownTokens(unknown));
        }
        self.apply(plan);
        Ok(())
    }

    fn plan(&self, request: &Enablement) -> (Plan, Vec<String>) {
        let mut plan = Plan::default();
        let mut unknown = Vec::new();

        let tokens = match request {
            Enablement::All => {
                plan.toolsets.extend(0..self.toolsets.len());
                return (plan, unknown);
            }
            Enablement::Tokens(tokens) => tokens,
        };

        for token in tokens {
            let mut matched = false;
            for (index, toolset) in self.toolsets.iter().enumerate() {
                if toolset.name() == token {
                    plan.toolsets.insert(index);
                    matched = true;
                }
                if let Some(method) = toolset.methods().find(|method| method.as_str() == token) {
                    plan.toolsets.insert(index);
                    plan.methods.push(method.clone());
                    matched = true;
                }
            }
            if !matched {
                unknown.push(token.clone());
            }
        }

        (plan, unknown)
    }

    fn apply(&mut self, plan: Plan) {
        for index in plan.toolsets {
            if self.enabled.insert(index) {
                info!(toolset = self.toolsets[index].name(), "toolset enabled");
            }
        }
        self.enabled_methods.extend(plan.methods);
    }

    /// Reports whether `token` names a toolset or method of this group.
    #[must_use]
    pub fn recognizes(&self, token: &str) -> bool {
        self.toolsets
            .iter()
            .any(|toolset| toolset.name() == token || toolset.contains(token))
    }

    /// Reports whether the named toolset is enabled.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled
            .iter()
            .any(|&index| self.toolsets[index].name() == name)
    }

    /// Methods that were explicitly requested and resolved.
    #[must_use]
    pub fn enabled_methods(&self) -> &BTreeSet<Method> {
        &self.enabled_methods
    }

    /// Returns the toolsets in insertion order.
    #[must_use]
    pub fn toolsets(&self) -> &[Toolset] {
        &self.toolsets
    }

    /// Returns whether write operations are suppressed.
    #[must_use]
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Operations visible to the serving layer, in toolset insertion order.
    ///
    /// An operation is exposed when its toolset is enabled and, for write
    /// operations, the group is not read-only.
    pub fn exposed(&self) -> impl Iterator<Item = (&Operation, ToolAccess)> {
        let include_writes = !self.read_only;
        self.enabled.iter().flat_map(move |&index| {
            let toolset = &self.toolsets[index];
            let reads = toolset
                .read_tools()
                .iter()
                .map(|operation| (operation, ToolAccess::Read));
            let writes = toolset
                .write_tools()
                .iter()
                .filter(move |_| include_writes)
                .map(|operation| (operation, ToolAccess::Write));
            reads.chain(writes)
        })
    }

    /// Returns true when at least one operation is exposed.
    #[must_use]
    pub fn has_tools(&self) -> bool {
        self.exposed().next().is_some()
    }

    /// Hands every exposed operation to `sink` and returns how many were added.
    ///
    /// # Errors
    ///
    /// Propagates the first sink error, e.g. [`ToolError::DuplicateTool`](crate::ToolError::DuplicateTool).
    pub fn register_all(&self, sink: &mut dyn ToolSink) -> ToolResult<usize> {
        let mut count = 0;
        for (operation, access) in self.exposed() {
            sink.add_tool(operation.clone(), access)?;
            count += 1;
        }
        debug!(count, read_only = self.read_only, "group registered");
        Ok(count)
    }
}

/// Applies one enablement request across several groups.
///
/// Each token must be recognised by at least one group. Tokens recognised by
/// no group are reported together and leave every group unchanged.
///
/// # Errors
///
/// Returns [`GroupError::UnknownTokens`] listing every unresolved token.
pub fn enable_groups(groups: &mut [ToolsetGroup], request: &Enablement) -> GroupResult<()> {
    let plans: Vec<_> = groups
        .iter()
        .map(|group| group.plan(request).0)
        .collect();

    if let Enablement::Tokens(tokens) = request {
        let unknown: Vec<_> = tokens
            .iter()
            .filter(|token| !groups.iter().any(|group| group.recognizes(token)))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(GroupError::UnknownTokens(unknown));
        }
    }

    for (group, plan) in groups.iter_mut().zip(plans) {
        group.apply(plan);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use mcp_binder::ArgumentBag;
    use serde_json::json;

    use super::*;
    use crate::registry::ToolRegistry;
    use crate::tool::ToolOutput;

    fn op(registry: &mut MethodRegistry, id: &str) -> Operation {
        let method = registry.register(id).unwrap();
        Operation::new(method, id, json!({ "type": "object" }), |_: ArgumentBag| async {
            Ok(ToolOutput::text("ok"))
        })
    }

    /// Toolset `a` holds `a1` (read) and `a2` (write); toolset `b` holds `b1`.
    fn group(read_only: bool) -> ToolsetGroup {
        let mut registry = MethodRegistry::new();
        let a = Toolset::new("a", "first")
            .add_read_tools([op(&mut registry, "a1")])
            .add_write_tools([op(&mut registry, "a2")]);
        let b = Toolset::new("b", "second").add_read_tools([op(&mut registry, "b1")]);

        let mut group = ToolsetGroup::new(read_only);
        group.add_toolset(a, &registry).unwrap();
        group.add_toolset(b, &registry).unwrap();
        group
    }

    fn exposed_names(group: &ToolsetGroup) -> Vec<&str> {
        group
            .exposed()
            .map(|(operation, _)| operation.method().as_str())
            .collect()
    }

    fn tokens(items: &[&str]) -> Enablement {
        Enablement::from_tokens(items)
    }

    #[test]
    fn enabling_a_method_exposes_its_toolset() {
        let mut group = group(false);
        assert!(!group.has_tools());

        group.enable_toolsets(&tokens(&["a1"])).unwrap();
        assert_eq!(exposed_names(&group), ["a1", "a2"]);
        assert!(group.has_tools());
        assert!(group.is_enabled("a"));
        assert!(!group.is_enabled("b"));
        assert!(group.enabled_methods().contains("a1"));

        let err = group
            .enable_toolsets(&tokens(&["z9"]))
            .expect_err("z9 is unknown");
        assert_eq!(err, GroupError::UnknownTokens(vec!["z9".into()]));
        assert_eq!(exposed_names(&group), ["a1", "a2"]);
        assert_eq!(group.enabled_methods().len(), 1);
    }

    #[test]
    fn read_only_hides_writes() {
        let mut group = group(true);
        group.enable_toolsets(&Enablement::All).unwrap();

        assert_eq!(exposed_names(&group), ["a1", "b1"]);
        assert!(group.exposed().all(|(_, access)| access == ToolAccess::Read));
    }

    #[test]
    fn all_matches_enabling_every_method() {
        let mut everything = group(false);
        everything.enable_toolsets(&tokens(&[" all "])).unwrap();

        let mut individually = group(false);
        individually
            .enable_toolsets(&tokens(&["a1", "a2", "b1"]))
            .unwrap();

        assert_eq!(exposed_names(&everything), exposed_names(&individually));
        assert!(everything.enabled_methods().is_empty());
    }

    #[test]
    fn unknown_tokens_are_collected_and_nothing_changes() {
        let mut group = group(false);
        let err = group
            .enable_toolsets(&tokens(&["bogus-method", "b1", "nope"]))
            .expect_err("two unknown tokens");

        let message = err.to_string();
        assert!(message.contains("bogus-method"));
        assert!(message.contains("nope"));
        assert!(!group.has_tools());
        assert!(group.enabled_methods().is_empty());
    }

    #[test]
    fn toolset_names_are_tokens() {
        let mut group = group(false);
        group.enable_toolsets(&tokens(&["b", ""])).unwrap();

        assert_eq!(exposed_names(&group), ["b1"]);
        assert!(group.recognizes("b"));
        assert!(group.recognizes("a2"));
        assert!(!group.recognizes("c"));
    }

    #[test]
    fn duplicate_toolset_names_are_rejected() {
        let registry = MethodRegistry::new();
        let mut group = ToolsetGroup::new(false);
        group.add_toolset(Toolset::new("a", ""), &registry).unwrap();

        let err = group
            .add_toolset(Toolset::new("a", ""), &registry)
            .expect_err("duplicate name");
        assert_eq!(err, GroupError::DuplicateToolset { name: "a".into() });
    }

    #[test]
    fn enablement_spans_groups() {
        let mut registry = MethodRegistry::new();
        let mut desk = ToolsetGroup::new(false);
        desk.add_toolset(
            Toolset::new("tickets", "").add_read_tools([op(&mut registry, "twdesk-list_tickets")]),
            &registry,
        )
        .unwrap();
        let mut projects = ToolsetGroup::new(false);
        projects
            .add_toolset(
                Toolset::new("tasks", "").add_read_tools([op(&mut registry, "twprojects-list_tasks")]),
                &registry,
            )
            .unwrap();
        let mut groups = [desk, projects];

        let err = enable_groups(&mut groups, &tokens(&["tickets", "bogus-method"]))
            .expect_err("bogus-method is unknown everywhere");
        assert_eq!(err, GroupError::UnknownTokens(vec!["bogus-method".into()]));
        assert!(groups.iter().all(|group| !group.has_tools()));

        enable_groups(&mut groups, &tokens(&["tickets"])).unwrap();
        assert!(groups[0].has_tools());
        assert!(!groups[1].has_tools());
    }

    #[test]
    fn register_all_feeds_the_sink() {
        let mut group = group(false);
        group.enable_toolsets(&Enablement::All).unwrap();

        let mut registry = ToolRegistry::new();
        assert_eq!(group.register_all(&mut registry).unwrap(), 3);
        assert_eq!(registry.len(), 3);

        let err = group.register_all(&mut registry).expect_err("already registered");
        assert!(matches!(err, crate::ToolError::DuplicateTool { name } if name == "a1"));
    }
}
