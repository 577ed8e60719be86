//! Seam between tool handlers and the remote Teamwork API.

use std::fmt;

use async_trait::async_trait;
use http::Method;
use mcp_tools::ToolError;
use serde_json::Value;
use thiserror::Error;

/// Result alias for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by API clients, classified by who is at fault.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API rejected the request (4xx).
    #[error("API rejected the request with {status}: {body}")]
    Client {
        /// HTTP status code.
        status: u16,
        /// Response body, usually a JSON error document.
        body: String,
    },

    /// The API failed to process the request (5xx).
    #[error("API failed with {status}: {body}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The request never produced a response.
    #[error("API transport failure: {reason}")]
    Transport {
        /// Human-readable explanation.
        reason: String,
    },

    /// The response body was not valid JSON.
    #[error("failed to decode API response: {reason}")]
    Decode {
        /// Human-readable explanation.
        reason: String,
    },

    /// The client was configured incorrectly.
    #[error("invalid API client configuration: {reason}")]
    Configuration {
        /// Human-readable explanation.
        reason: String,
    },
}

impl ApiError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}

impl From<ApiError> for ToolError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Client { status, body } => ToolError::Rejected {
                status,
                reason: body,
            },
            other => ToolError::execution(other.to_string()),
        }
    }
}

/// One call against the API, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PATCH` request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE` request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn query(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.query.push((key.to_owned(), value.to_string()));
        self
    }

    /// Appends a query parameter when a value is present.
    #[must_use]
    pub fn query_opt<T: fmt::Display>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Appends a comma-separated list parameter unless the list is empty.
    #[must_use]
    pub fn query_list<T: fmt::Display>(self, key: &str, values: &[T]) -> Self {
        if values.is_empty() {
            return self;
        }
        let joined = values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.query(key, joined)
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path relative to the base URL.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the query parameters in insertion order.
    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Returns the JSON body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// Client used by tool handlers. Shared by every call.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Sends the request and returns the decoded JSON response.
    ///
    /// Empty response bodies decode to `null`.
    async fn send(&self, request: ApiRequest) -> ApiResult<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_query() {
        let request = ApiRequest::get("/desk/api/v2/tickets.json")
            .query("page", 2)
            .query_opt("orderBy", None::<&str>)
            .query_list("inboxIds", &[3_u64, 4])
            .query_list::<u64>("tagIds", &[]);

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(
            request.query_pairs(),
            [
                ("page".to_owned(), "2".to_owned()),
                ("inboxIds".to_owned(), "3,4".to_owned())
            ]
        );
        assert!(request.body().is_none());
    }

    #[test]
    fn client_errors_become_rejections() {
        let rejected = ToolError::from(ApiError::Client {
            status: 404,
            body: "not found".into(),
        });
        assert!(matches!(rejected, ToolError::Rejected { status: 404, .. }));
        assert!(rejected.is_tool_failure());

        let failed = ToolError::from(ApiError::Server {
            status: 503,
            body: "maintenance".into(),
        });
        assert!(matches!(failed, ToolError::Execution { reason } if reason.contains("503")));
    }
}
