//! Helpers shared by the surface modules.

use std::future::Future;
use std::ops::RangeInclusive;
use std::sync::Arc;

use mcp_binder::ArgumentBag;
use mcp_policy::{AccessPolicy, ToolClass};
use mcp_primitives::Method;
use mcp_tools::{Operation, ToolError, ToolOutput, ToolResult};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::client::{ApiClient, ApiRequest};

/// Wraps an `async fn(client, args)` handler into an [`Operation`].
pub(crate) fn operation<F, Fut>(
    method: &Method,
    description: &str,
    input_schema: Value,
    client: &Arc<dyn ApiClient>,
    handler: F,
) -> Operation
where
    F: Fn(Arc<dyn ApiClient>, ArgumentBag) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolResult<ToolOutput>> + Send + 'static,
{
    let client = Arc::clone(client);
    Operation::new(
        method.clone(),
        description,
        input_schema,
        move |args: ArgumentBag| handler(Arc::clone(&client), args),
    )
}

/// Returns the delete operation when the policy allows deletes.
pub(crate) fn gate_delete(policy: &AccessPolicy, operation: Operation) -> Option<Operation> {
    let decision = policy.evaluate(ToolClass::Delete);
    if decision.is_allow() {
        return Some(operation.destructive());
    }
    debug!(
        method = %operation.method(),
        reason = decision.reason().unwrap_or_default(),
        "delete tool withheld"
    );
    None
}

/// Sends the request and returns the response as pretty JSON.
pub(crate) async fn forward(client: &dyn ApiClient, request: ApiRequest) -> ToolResult<ToolOutput> {
    let response = client.send(request).await?;
    ToolOutput::json(&response)
}

/// Encodes `value` as `{ key: value }`, the envelope used by write endpoints.
pub(crate) fn envelope<T: Serialize>(key: &str, value: &T) -> ToolResult<Value> {
    let encoded = serde_json::to_value(value)
        .map_err(|err| ToolError::execution(format!("failed to encode request: {err}")))?;
    let mut body = Map::new();
    body.insert(key.to_owned(), encoded);
    Ok(Value::Object(body))
}

/// Paging parameters accepted by every list tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Page {
    pub(crate) page: u32,
    pub(crate) page_size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
        }
    }
}

impl Page {
    pub(crate) const SIZES: &'static [u32] = &[10, 25, 50, 100, 250];
    pub(crate) const NUMBERS: RangeInclusive<u32> = 1..=u32::MAX;

    pub(crate) fn apply(self, request: ApiRequest) -> ApiRequest {
        request
            .query("page", self.page)
            .query("pageSize", self.page_size)
    }
}

/// Schema fragment for the paging parameters.
pub(crate) fn page_properties() -> Value {
    json!({
        "page": { "type": "integer", "minimum": 1, "description": "Page number, starting at 1." },
        "pageSize": {
            "type": "integer",
            "enum": Page::SIZES,
            "description": "Results per page."
        }
    })
}

/// Builds an object schema from property definitions and required keys.
pub(crate) fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Merges the paging properties into a property map.
pub(crate) fn with_paging(mut properties: Value) -> Value {
    if let (Some(target), Value::Object(paging)) = (properties.as_object_mut(), page_properties()) {
        target.extend(paging);
    }
    properties
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_gating_follows_policy() {
        let op = Operation::new(
            Method::new("twdesk-delete_ticket").unwrap(),
            "",
            json!({}),
            |_: ArgumentBag| async { Ok(ToolOutput::text("")) },
        );

        assert!(gate_delete(&AccessPolicy::new(false, false), op.clone()).is_none());
        assert!(gate_delete(&AccessPolicy::new(true, true), op.clone()).is_none());
        let allowed = gate_delete(&AccessPolicy::new(false, true), op).unwrap();
        assert!(allowed.is_destructive());
    }

    #[test]
    fn schema_helpers() {
        let schema = object_schema(with_paging(json!({ "id": { "type": "integer" } })), &["id"]);
        assert_eq!(schema["required"], json!(["id"]));
        assert!(schema["properties"]["pageSize"].is_object());
        assert_eq!(
            envelope("ticket", &json!({ "subject": "x" })).unwrap(),
            json!({ "ticket": { "subject": "x" } })
        );
    }
}
