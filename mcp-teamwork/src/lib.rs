//! Teamwork tool surfaces for the MCP server.
//!
//! Two surfaces are provided, each as a group of toolsets:
//!
//! - [`desk`]: tickets and customers (`twdesk-*` methods).
//! - [`projects`]: tasks and time logs (`twprojects-*` methods).
//!
//! Handlers never talk HTTP directly; they build [`ApiRequest`]s and hand them
//! to an [`ApiClient`]. [`HttpApiClient`] is the production implementation.

#![warn(missing_docs, clippy::pedantic)]

mod client;
pub mod desk;
mod http_client;
pub mod projects;
mod support;

pub use client::{ApiClient, ApiError, ApiRequest, ApiResult};
pub use http_client::{HttpApiClient, HttpClientConfig};
