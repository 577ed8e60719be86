//! Serving layer for the tool server.
//!
//! [`McpServer`] implements the rmcp server handler over the frozen tool
//! registry, [`serve`] drives an MCP session over any line-oriented byte
//! stream, and [`TaskScheduler`] bounds how many tool calls run at once.

#![warn(missing_docs, clippy::pedantic)]

mod scheduler;
mod server;
mod transport;

pub use rmcp::model::Implementation;
pub use scheduler::{SchedulerConfig, SchedulerError, SchedulerResult, TaskScheduler};
pub use server::McpServer;
pub use transport::{TransportError, TransportResult, serve, serve_stdio};
