//! Shared error definitions for method registration.

use thiserror::Error;

/// Result alias used by the method registry.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while declaring methods.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Method identifier failed validation.
    #[error("invalid method `{id}`: {reason}")]
    InvalidMethod {
        /// The offending identifier string.
        id: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Identifier collides with the enablement sentinel.
    #[error("method `{id}` is reserved")]
    ReservedMethod {
        /// The reserved identifier.
        id: String,
    },

    /// Identifier was already declared, usually by another surface.
    #[error("method `{id}` is already registered")]
    DuplicateMethod {
        /// The duplicated identifier.
        id: String,
    },
}
