//! Time log tools.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use mcp_binder::{ArgumentBag, bind, optional, optional_ptr, required};
use mcp_policy::AccessPolicy;
use mcp_tools::{ToolOutput, ToolResult, Toolset};
use serde::Serialize;
use serde_json::json;

use super::ProjectsMethods;
use crate::client::{ApiClient, ApiRequest};
use crate::support::{Page, envelope, forward, gate_delete, object_schema, operation, with_paging};

pub(super) fn toolset(
    methods: &ProjectsMethods,
    client: &Arc<dyn ApiClient>,
    policy: &AccessPolicy,
) -> Toolset {
    let reads = [operation(
        &methods.list_timelogs,
        "List time logs across all projects or within one project.",
        object_schema(
            with_paging(json!({
                "projectId": { "type": "integer" },
                "userIds": { "type": "array", "items": { "type": "integer" } },
                "startDate": { "type": "string", "format": "date", "description": "YYYY-MM-DD" },
                "endDate": { "type": "string", "format": "date", "description": "YYYY-MM-DD" }
            })),
            &[],
        ),
        client,
        list_timelogs,
    )];

    let mut writes = vec![operation(
        &methods.create_timelog,
        "Log time against a project, or against a task when taskId is given.",
        object_schema(
            json!({
                "projectId": { "type": "integer" },
                "taskId": { "type": "integer" },
                "date": { "type": "string", "format": "date", "description": "YYYY-MM-DD" },
                "time": { "type": "string", "description": "Start time, HH:MM:SS" },
                "hours": { "type": "integer", "minimum": 0 },
                "minutes": { "type": "integer", "minimum": 0, "maximum": 59 },
                "description": { "type": "string" },
                "isBillable": { "type": "boolean" }
            }),
            &["projectId", "date", "time", "hours"],
        ),
        client,
        create_timelog,
    )];
    writes.extend(gate_delete(
        policy,
        operation(
            &methods.delete_timelog,
            "Permanently delete a time log.",
            object_schema(
                json!({ "id": { "type": "integer", "description": "Time log ID." } }),
                &["id"],
            ),
            client,
            delete_timelog,
        ),
    ));

    Toolset::new("timelogs", "Teamwork Projects time tracking")
        .add_read_tools(reads)
        .add_write_tools(writes)
}

#[derive(Debug, Default)]
struct ListTimelogs {
    project_id: Option<u64>,
    user_ids: Vec<u64>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    page: Page,
}

async fn list_timelogs(client: Arc<dyn ApiClient>, args: ArgumentBag) -> ToolResult<ToolOutput> {
    let mut req = ListTimelogs::default();
    bind(
        &args,
        &mut [
            &mut optional_ptr("projectId", &mut req.project_id),
            &mut optional("userIds", &mut req.user_ids),
            &mut optional_ptr("startDate", &mut req.start_date),
            &mut optional_ptr("endDate", &mut req.end_date),
            &mut optional("page", &mut req.page.page).in_range(Page::NUMBERS),
            &mut optional("pageSize", &mut req.page.page_size).one_of(Page::SIZES),
        ],
    )?;

    let path = match req.project_id {
        Some(project) => format!("projects/api/v3/projects/{project}/time.json"),
        None => "projects/api/v3/time.json".to_owned(),
    };
    let request = req
        .page
        .apply(ApiRequest::get(path))
        .query_list("assignedToUserIds", &req.user_ids)
        .query_opt("startDate", req.start_date)
        .query_opt("endDate", req.end_date);
    forward(client.as_ref(), request).await
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewTimelog {
    #[serde(skip)]
    project_id: u64,
    #[serde(skip)]
    task_id: Option<u64>,
    date: NaiveDate,
    time: NaiveTime,
    hours: u32,
    minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    is_billable: bool,
}

async fn create_timelog(client: Arc<dyn ApiClient>, args: ArgumentBag) -> ToolResult<ToolOutput> {
    let mut log = NewTimelog::default();
    bind(
        &args,
        &mut [
            &mut required("projectId", &mut log.project_id),
            &mut optional_ptr("taskId", &mut log.task_id),
            &mut required("date", &mut log.date),
            &mut required("time", &mut log.time),
            &mut required("hours", &mut log.hours),
            &mut optional("minutes", &mut log.minutes).in_range(0..=59),
            &mut optional_ptr("description", &mut log.description),
            &mut optional("isBillable", &mut log.is_billable),
        ],
    )?;

    let path = match log.task_id {
        Some(task) => format!("projects/api/v3/tasks/{task}/time.json"),
        None => format!("projects/api/v3/projects/{}/time.json", log.project_id),
    };
    let request = ApiRequest::post(path).json(envelope("timelog", &log)?);
    forward(client.as_ref(), request).await
}

async fn delete_timelog(client: Arc<dyn ApiClient>, args: ArgumentBag) -> ToolResult<ToolOutput> {
    let mut id = 0_u64;
    bind(&args, &mut [&mut required("id", &mut id)])?;
    client
        .send(ApiRequest::delete(format!("projects/api/v3/time/{id}.json")))
        .await?;
    Ok(ToolOutput::text(format!("time log {id} deleted")))
}
