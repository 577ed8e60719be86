//! Core identifier types shared by every integration surface.
//!
//! A [`Method`] names one exposed operation. Every surface declares its methods
//! exactly once in a [`MethodRegistry`] during startup; the registry is then
//! shared read-only for the rest of the process lifetime.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod method;

/// Error type and result alias for method registration.
pub use error::{Error, Result};
/// Method identifiers and the startup registry.
pub use method::{ALL_METHODS, Method, MethodRegistry};
