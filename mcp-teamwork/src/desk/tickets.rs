//! Ticket tools.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use mcp_binder::{ArgumentBag, bind, optional, optional_ptr, required};
use mcp_policy::AccessPolicy;
use mcp_tools::{ToolOutput, ToolResult, Toolset};
use serde::Serialize;
use serde_json::json;

use super::DeskMethods;
use crate::client::{ApiClient, ApiRequest};
use crate::support::{Page, envelope, forward, gate_delete, object_schema, operation, with_paging};

const STATUSES: &[&str] = &["open", "waiting", "on-hold", "solved", "closed"];
const PRIORITIES: &[&str] = &["low", "medium", "high", "urgent"];
const ORDER_BY: &[&str] = &["createdAt", "updatedAt", "priority"];

pub(super) fn toolset(
    methods: &DeskMethods,
    client: &Arc<dyn ApiClient>,
    policy: &AccessPolicy,
) -> Toolset {
    let id_only = object_schema(
        json!({ "id": { "type": "integer", "description": "Ticket ID." } }),
        &["id"],
    );

    let reads = [
        operation(
            &methods.list_tickets,
            "List tickets, optionally filtered by status, inbox, or last update.",
            object_schema(
                with_paging(json!({
                    "status": { "type": "array", "items": { "type": "string", "enum": STATUSES } },
                    "inboxIds": { "type": "array", "items": { "type": "integer" } },
                    "updatedAfter": { "type": "string", "format": "date-time" },
                    "orderBy": { "type": "string", "enum": ORDER_BY }
                })),
                &[],
            ),
            client,
            list_tickets,
        ),
        operation(
            &methods.get_ticket,
            "Fetch a single ticket by ID.",
            id_only.clone(),
            client,
            get_ticket,
        ),
    ];

    let mut writes = vec![
        operation(
            &methods.create_ticket,
            "Create a ticket in an inbox.",
            object_schema(
                json!({
                    "subject": { "type": "string" },
                    "body": { "type": "string" },
                    "inboxId": { "type": "integer" },
                    "customerId": { "type": "integer" },
                    "priority": { "type": "string", "enum": PRIORITIES },
                    "dueDate": { "type": "string", "format": "date", "description": "YYYY-MM-DD" },
                    "tagIds": { "type": "array", "items": { "type": "integer" } }
                }),
                &["subject", "body", "inboxId"],
            ),
            client,
            create_ticket,
        ),
        operation(
            &methods.update_ticket,
            "Update the subject, status, priority, or due date of a ticket.",
            object_schema(
                json!({
                    "id": { "type": "integer" },
                    "subject": { "type": "string" },
                    "status": { "type": "string", "enum": STATUSES },
                    "priority": { "type": "string", "enum": PRIORITIES },
                    "dueDate": { "type": "string", "format": "date", "description": "YYYY-MM-DD" }
                }),
                &["id"],
            ),
            client,
            update_ticket,
        ),
    ];
    writes.extend(gate_delete(
        policy,
        operation(
            &methods.delete_ticket,
            "Permanently delete a ticket.",
            id_only,
            client,
            delete_ticket,
        ),
    ));

    Toolset::new("tickets", "Teamwork Desk tickets")
        .add_read_tools(reads)
        .add_write_tools(writes)
}

#[derive(Debug, Default)]
struct ListTickets {
    statuses: Vec<String>,
    inbox_ids: Vec<u64>,
    updated_after: Option<DateTime<Utc>>,
    order_by: Option<String>,
    page: Page,
}

async fn list_tickets(client: Arc<dyn ApiClient>, args: ArgumentBag) -> ToolResult<ToolOutput> {
    let mut req = ListTickets::default();
    bind(
        &args,
        &mut [
            &mut optional("status", &mut req.statuses).each_one_of(STATUSES),
            &mut optional("inboxIds", &mut req.inbox_ids),
            &mut optional_ptr("updatedAfter", &mut req.updated_after),
            &mut optional_ptr("orderBy", &mut req.order_by).one_of(ORDER_BY),
            &mut optional("page", &mut req.page.page).in_range(Page::NUMBERS),
            &mut optional("pageSize", &mut req.page.page_size).one_of(Page::SIZES),
        ],
    )?;

    let request = req
        .page
        .apply(ApiRequest::get("desk/api/v2/tickets.json"))
        .query_list("statuses", &req.statuses)
        .query_list("inboxIds", &req.inbox_ids)
        .query_opt("updatedAfter", req.updated_after.map(|at| at.to_rfc3339()))
        .query_opt("orderBy", req.order_by);
    forward(client.as_ref(), request).await
}

async fn get_ticket(client: Arc<dyn ApiClient>, args: ArgumentBag) -> ToolResult<ToolOutput> {
    let mut id = 0_u64;
    bind(&args, &mut [&mut required("id", &mut id)])?;
    forward(
        client.as_ref(),
        ApiRequest::get(format!("desk/api/v2/tickets/{id}.json")),
    )
    .await
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewTicket {
    subject: String,
    body: String,
    inbox_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tag_ids: Vec<u64>,
}

async fn create_ticket(client: Arc<dyn ApiClient>, args: ArgumentBag) -> ToolResult<ToolOutput> {
    let mut ticket = NewTicket::default();
    bind(
        &args,
        &mut [
            &mut required("subject", &mut ticket.subject),
            &mut required("body", &mut ticket.body),
            &mut required("inboxId", &mut ticket.inbox_id),
            &mut optional_ptr("customerId", &mut ticket.customer_id),
            &mut optional_ptr("priority", &mut ticket.priority).one_of(PRIORITIES),
            &mut optional_ptr("dueDate", &mut ticket.due_date),
            &mut optional("tagIds", &mut ticket.tag_ids),
        ],
    )?;

    let request = ApiRequest::post("desk/api/v2/tickets.json").json(envelope("ticket", &ticket)?);
    forward(client.as_ref(), request).await
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct TicketUpdate {
    #[serde(skip)]
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<NaiveDate>,
}

async fn update_ticket(client: Arc<dyn ApiClient>, args: ArgumentBag) -> ToolResult<ToolOutput> {
    let mut update = TicketUpdate::default();
    bind(
        &args,
        &mut [
            &mut required("id", &mut update.id),
            &mut optional_ptr("subject", &mut update.subject),
            &mut optional_ptr("status", &mut update.status).one_of(STATUSES),
            &mut optional_ptr("priority", &mut update.priority).one_of(PRIORITIES),
            &mut optional_ptr("dueDate", &mut update.due_date),
        ],
    )?;

    let request = ApiRequest::patch(format!("desk/api/v2/tickets/{}.json", update.id))
        .json(envelope("ticket", &update)?);
    forward(client.as_ref(), request).await
}

async fn delete_ticket(client: Arc<dyn ApiClient>, args: ArgumentBag) -> ToolResult<ToolOutput> {
    let mut id = 0_u64;
    bind(&args, &mut [&mut required("id", &mut id)])?;
    client
        .send(ApiRequest::delete(format!("desk/api/v2/tickets/{id}.json")))
        .await?;
    Ok(ToolOutput::text(format!("ticket {id} deleted")))
}
