//! Customer tools.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mcp_binder::{ArgumentBag, bind, optional, optional_ptr, required};
use mcp_policy::AccessPolicy;
use mcp_tools::{ToolOutput, ToolResult, Toolset};
use serde::Serialize;
use serde_json::json;

use super::DeskMethods;
use crate::client::{ApiClient, ApiRequest};
use crate::support::{Page, envelope, forward, gate_delete, object_schema, operation, with_paging};

pub(super) fn toolset(
    methods: &DeskMethods,
    client: &Arc<dyn ApiClient>,
    policy: &AccessPolicy,
) -> Toolset {
    let id_only = object_schema(
        json!({ "id": { "type": "integer", "description": "Customer ID." } }),
        &["id"],
    );

    let reads = [
        operation(
            &methods.list_customers,
            "List customers, optionally matching a search term.",
            object_schema(
                with_paging(json!({
                    "search": { "type": "string" },
                    "updatedAfter": { "type": "string", "format": "date-time" }
                })),
                &[],
            ),
            client,
            list_customers,
        ),
        operation(
            &methods.get_customer,
            "Fetch a single customer by ID.",
            id_only.clone(),
            client,
            get_customer,
        ),
    ];

    let mut writes = vec![operation(
        &methods.create_customer,
        "Create a customer record.",
        object_schema(
            json!({
                "email": { "type": "string", "format": "email" },
                "firstName": { "type": "string" },
                "lastName": { "type": "string" },
                "phone": { "type": "string" }
            }),
            &["email"],
        ),
        client,
        create_customer,
    )];
    writes.extend(gate_delete(
        policy,
        operation(
            &methods.delete_customer,
            "Permanently delete a customer.",
            id_only,
            client,
            delete_customer,
        ),
    ));

    Toolset::new("customers", "Teamwork Desk customers")
        .add_read_tools(reads)
        .add_write_tools(writes)
}

async fn list_customers(client: Arc<dyn ApiClient>, args: ArgumentBag) -> ToolResult<ToolOutput> {
    let mut search: Option<String> = None;
    let mut updated_after: Option<DateTime<Utc>> = None;
    let mut page = Page::default();
    bind(
        &args,
        &mut [
            &mut optional_ptr("search", &mut search),
            &mut optional_ptr("updatedAfter", &mut updated_after),
            &mut optional("page", &mut page.page).in_range(Page::NUMBERS),
            &mut optional("pageSize", &mut page.page_size).one_of(Page::SIZES),
        ],
    )?;

    let request = page
        .apply(ApiRequest::get("desk/api/v2/customers.json"))
        .query_opt("search", search)
        .query_opt("updatedAfter", updated_after.map(|at| at.to_rfc3339()));
    forward(client.as_ref(), request).await
}

async fn get_customer(client: Arc<dyn ApiClient>, args: ArgumentBag) -> ToolResult<ToolOutput> {
    let mut id = 0_u64;
    bind(&args, &mut [&mut required("id", &mut id)])?;
    forward(
        client.as_ref(),
        ApiRequest::get(format!("desk/api/v2/customers/{id}.json")),
    )
    .await
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewCustomer {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
}

async fn create_customer(client: Arc<dyn ApiClient>, args: ArgumentBag) -> ToolResult<ToolOutput> {
    let mut customer = NewCustomer::default();
    bind(
        &args,
        &mut [
            &mut required("email", &mut customer.email),
            &mut optional_ptr("firstName", &mut customer.first_name),
            &mut optional_ptr("lastName", &mut customer.last_name),
            &mut optional_ptr("phone", &mut customer.phone),
        ],
    )?;

    let request =
        ApiRequest::post("desk/api/v2/customers.json").json(envelope("customer", &customer)?);
    forward(client.as_ref(), request).await
}

async fn delete_customer(client: Arc<dyn ApiClient>, args: ArgumentBag) -> ToolResult<ToolOutput> {
    let mut id = 0_u64;
    bind(&args, &mut [&mut required("id", &mut id)])?;
    client
        .send(ApiRequest::delete(format!("desk/api/v2/customers/{id}.json")))
        .await?;
    Ok(ToolOutput::text(format!("customer {id} deleted")))
}

#[cfg(test)]
mod tests {
    use mcp_tools::ToolError;

    use super::*;
    use crate::support::testing::{RecordingClient, query};

    fn bag(value: serde_json::Value) -> ArgumentBag {
        ArgumentBag::from_json(value).unwrap()
    }

    #[tokio::test]
    async fn search_is_forwarded() {
        let fake = Arc::new(RecordingClient::ok());
        list_customers(fake.clone(), bag(json!({ "search": "acme", "page": 3 })))
            .await
            .unwrap();

        let request = fake.last();
        assert_eq!(request.path(), "desk/api/v2/customers.json");
        assert_eq!(query(&request, "search").as_deref(), Some("acme"));
        assert_eq!(query(&request, "page").as_deref(), Some("3"));
        assert_eq!(query(&request, "updatedAfter"), None);
    }

    #[tokio::test]
    async fn null_arguments_are_absent() {
        let fake = Arc::new(RecordingClient::ok());
        get_customer(fake.clone(), bag(json!({ "id": 44, "extra": null })))
            .await
            .unwrap();
        assert_eq!(fake.last().path(), "desk/api/v2/customers/44.json");

        let err = get_customer(fake, bag(json!({ "id": null })))
            .await
            .expect_err("null id is missing");
        assert_eq!(err.to_string(), "invalid parameters: missing required parameter `id`");
    }

    #[tokio::test]
    async fn create_rejects_wrong_types() {
        let fake = Arc::new(RecordingClient::ok());
        let err = create_customer(fake.clone(), bag(json!({ "email": 42, "phone": true })))
            .await
            .expect_err("wrong types");

        let ToolError::InvalidParams(errors) = err else {
            panic!("expected invalid params");
        };
        assert_eq!(errors.len(), 2);
        assert!(fake.requests().is_empty());

        create_customer(fake.clone(), bag(json!({ "email": "ops@acme.test" })))
            .await
            .unwrap();
        assert_eq!(
            fake.last().body(),
            Some(&json!({ "customer": { "email": "ops@acme.test" } }))
        );
    }
}
