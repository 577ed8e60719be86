//! Gating of tool classes by server mode.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decision::PolicyDecision;

/// Coarse classification of an operation by its side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolClass {
    /// Observes remote state only.
    Read,
    /// Creates or modifies remote state.
    Write,
    /// Removes remote state.
    Delete,
}

/// Server-wide access settings fixed at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    read_only: bool,
    allow_delete: bool,
}

impl AccessPolicy {
    /// Creates a policy from the two server switches.
    #[must_use]
    pub const fn new(read_only: bool, allow_delete: bool) -> Self {
        Self {
            read_only,
            allow_delete,
        }
    }

    /// Returns whether every mutating tool is suppressed.
    #[must_use]
    pub const fn read_only(&self) -> bool {
        self.read_only
    }

    /// Returns whether delete tools were opted into.
    #[must_use]
    pub const fn allow_delete(&self) -> bool {
        self.allow_delete
    }

    /// Decides whether tools of `class` may be exposed.
    #[must_use]
    pub fn evaluate(&self, class: ToolClass) -> PolicyDecision {
        let decision = match class {
            ToolClass::Read => PolicyDecision::Allow,
            ToolClass::Write | ToolClass::Delete if self.read_only => {
                PolicyDecision::deny("server is running in read-only mode")
            }
            ToolClass::Delete if !self.allow_delete => {
                PolicyDecision::deny("delete tools are disabled")
            }
            ToolClass::Write | ToolClass::Delete => PolicyDecision::Allow,
        };

        debug!(?class, allow = decision.is_allow(), "access policy evaluated");
        decision
    }
}
