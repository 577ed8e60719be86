//! Access policy deciding which classes of tools a server may expose.
//!
//! Read tools are always available. Write tools disappear in read-only mode,
//! and delete tools additionally require an explicit opt-in.

#![warn(missing_docs, clippy::pedantic)]

mod access;
mod decision;

pub use access::{AccessPolicy, ToolClass};
pub use decision::PolicyDecision;
