//! Task tools.

use std::sync::Arc;

use chrono::NaiveDate;
use mcp_binder::{ArgumentBag, LegacyDate, bind, optional, optional_ptr, required};
use mcp_policy::AccessPolicy;
use mcp_tools::{ToolOutput, ToolResult, Toolset};
use serde::Serialize;
use serde_json::json;

use super::ProjectsMethods;
use crate::client::{ApiClient, ApiRequest};
use crate::support::{Page, envelope, forward, gate_delete, object_schema, operation, with_paging};

const PRIORITIES: &[&str] = &["low", "medium", "high"];

pub(super) fn toolset(
    methods: &ProjectsMethods,
    client: &Arc<dyn ApiClient>,
    policy: &AccessPolicy,
) -> Toolset {
    let id_only = object_schema(
        json!({ "id": { "type": "integer", "description": "Task ID." } }),
        &["id"],
    );

    let reads = [
        operation(
            &methods.list_tasks,
            "List tasks across all projects or within one project.",
            object_schema(
                with_paging(json!({
                    "projectId": { "type": "integer" },
                    "startDate": { "type": "string", "description": "YYYYMMDD" },
                    "endDate": { "type": "string", "description": "YYYYMMDD" },
                    "includeCompleted": { "type": "boolean" },
                    "tagIds": { "type": "array", "items": { "type": "integer" } }
                })),
                &[],
            ),
            client,
            list_tasks,
        ),
        operation(
            &methods.get_task,
            "Fetch a single task by ID.",
            id_only.clone(),
            client,
            get_task,
        ),
    ];

    let mut writes = vec![
        operation(
            &methods.create_task,
            "Create a task in a task list.",
            object_schema(
                json!({
                    "tasklistId": { "type": "integer" },
                    "name": { "type": "string" },
                    "description": { "type": "string" },
                    "priority": { "type": "string", "enum": PRIORITIES },
                    "startDate": { "type": "string", "format": "date", "description": "YYYY-MM-DD" },
                    "dueDate": { "type": "string", "format": "date", "description": "YYYY-MM-DD" },
                    "assigneeUserIds": { "type": "array", "items": { "type": "integer" } },
                    "estimateMinutes": { "type": "integer", "minimum": 0 }
                }),
                &["tasklistId", "name"],
            ),
            client,
            create_task,
        ),
        operation(
            &methods.update_task,
            "Update a task.",
            object_schema(
                json!({
                    "id": { "type": "integer" },
                    "name": { "type": "string" },
                    "description": { "type": "string" },
                    "priority": { "type": "string", "enum": PRIORITIES },
                    "dueDate": { "type": "string", "format": "date", "description": "YYYY-MM-DD" },
                    "progress": { "type": "integer", "minimum": 0, "maximum": 100 }
                }),
                &["id"],
            ),
            client,
            update_task,
        ),
    ];
    writes.extend(gate_delete(
        policy,
        operation(
            &methods.delete_task,
            "Permanently delete a task.",
            id_only,
            client,
            delete_task,
        ),
    ));

    Toolset::new("tasks", "Teamwork Projects tasks")
        .add_read_tools(reads)
        .add_write_tools(writes)
}

#[derive(Debug, Default)]
struct ListTasks {
    project_id: Option<u64>,
    start_date: Option<LegacyDate>,
    end_date: Option<LegacyDate>,
    include_completed: bool,
    tag_ids: Vec<u64>,
    page: Page,
}

async fn list_tasks(client: Arc<dyn ApiClient>, args: ArgumentBag) -> ToolResult<ToolOutput> {
    let mut req = ListTasks::default();
    bind(
        &args,
        &mut [
            &mut optional_ptr("projectId", &mut req.project_id),
            &mut optional_ptr("startDate", &mut req.start_date),
            &mut optional_ptr("endDate", &mut req.end_date),
            &mut optional("includeCompleted", &mut req.include_completed),
            &mut optional("tagIds", &mut req.tag_ids),
            &mut optional("page", &mut req.page.page).in_range(Page::NUMBERS),
            &mut optional("pageSize", &mut req.page.page_size).one_of(Page::SIZES),
        ],
    )?;

    let path = match req.project_id {
        Some(project) => format!("projects/api/v3/projects/{project}/tasks.json"),
        None => "projects/api/v3/tasks.json".to_owned(),
    };
    let request = req
        .page
        .apply(ApiRequest::get(path))
        .query_opt("startDate", req.start_date)
        .query_opt("endDate", req.end_date)
        .query("includeCompletedTasks", req.include_completed)
        .query_list("tagIds", &req.tag_ids);
    forward(client.as_ref(), request).await
}

async fn get_task(client: Arc<dyn ApiClient>, args: ArgumentBag) -> ToolResult<ToolOutput> {
    let mut id = 0_u64;
    bind(&args, &mut [&mut required("id", &mut id)])?;
    forward(
        client.as_ref(),
        ApiRequest::get(format!("projects/api/v3/tasks/{id}.json")),
    )
    .await
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewTask {
    #[serde(skip)]
    tasklist_id: u64,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_at: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_at: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    assignee_user_ids: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimate_minutes: Option<u32>,
}

async fn create_task(client: Arc<dyn ApiClient>, args: ArgumentBag) -> ToolResult<ToolOutput> {
    let mut task = NewTask::default();
    bind(
        &args,
        &mut [
            &mut required("tasklistId", &mut task.tasklist_id),
            &mut required("name", &mut task.name),
            &mut optional_ptr("description", &mut task.description),
            &mut optional_ptr("priority", &mut task.priority).one_of(PRIORITIES),
            &mut optional_ptr("startDate", &mut task.start_at),
            &mut optional_ptr("dueDate", &mut task.due_at),
            &mut optional("assigneeUserIds", &mut task.assignee_user_ids),
            &mut optional_ptr("estimateMinutes", &mut task.estimate_minutes),
        ],
    )?;

    let request = ApiRequest::post(format!(
        "projects/api/v3/tasklists/{}/tasks.json",
        task.tasklist_id
    ))
    .json(envelope("task", &task)?);
    forward(client.as_ref(), request).await
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskUpdate {
    #[serde(skip)]
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_at: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<u8>,
}

async fn update_task(client: Arc<dyn ApiClient>, args: ArgumentBag) -> ToolResult<ToolOutput> {
    let mut update = TaskUpdate::default();
    bind(
        &args,
        &mut [
            &mut required("id", &mut update.id),
            &mut optional_ptr("name", &mut update.name),
            &mut optional_ptr("description", &mut update.description),
            &mut optional_ptr("priority", &mut update.priority).one_of(PRIORITIES),
            &mut optional_ptr("dueDate", &mut update.due_at),
            &mut optional_ptr("progress", &mut update.progress).in_range(0..=100),
        ],
    )?;

    let request = ApiRequest::patch(format!("projects/api/v3/tasks/{}.json", update.id))
        .json(envelope("task", &update)?);
    forward(client.as_ref(), request).await
}

async fn delete_task(client: Arc<dyn ApiClient>, args: ArgumentBag) -> ToolResult<ToolOutput> {
    let mut id = 0_u64;
    bind(&args, &mut [&mut required("id", &mut id)])?;
    client
        .send(ApiRequest::delete(format!("projects/api/v3/tasks/{id}.json")))
        .await?;
    Ok(ToolOutput::text(format!("task {id} deleted")))
}

#[cfg(test)]
mod tests {
    use mcp_binder::BindError;
    use mcp_tools::ToolError;

    use super::*;
    use crate::support::testing::{RecordingClient, query};

    fn bag(value: serde_json::Value) -> ArgumentBag {
        ArgumentBag::from_json(value).unwrap()
    }

    #[tokio::test]
    async fn list_uses_compact_dates() {
        let fake = Arc::new(RecordingClient::ok());
        list_tasks(
            fake.clone(),
            bag(json!({
                "projectId": 99,
                "startDate": "20240101",
                "endDate": "20240131",
                "tagIds": [1, 2]
            })),
        )
        .await
        .unwrap();

        let request = fake.last();
        assert_eq!(request.path(), "projects/api/v3/projects/99/tasks.json");
        assert_eq!(query(&request, "startDate").as_deref(), Some("20240101"));
        assert_eq!(query(&request, "endDate").as_deref(), Some("20240131"));
        assert_eq!(query(&request, "includeCompletedTasks").as_deref(), Some("false"));
        assert_eq!(query(&request, "tagIds").as_deref(), Some("1,2"));
    }

    #[tokio::test]
    async fn list_rejects_iso_dates() {
        let fake = Arc::new(RecordingClient::ok());
        let err = list_tasks(fake.clone(), bag(json!({ "startDate": "2024-01-01" })))
            .await
            .expect_err("legacy layout required");

        let ToolError::InvalidParams(errors) = err else {
            panic!("expected invalid params");
        };
        assert_eq!(
            errors.errors()[0],
            BindError::BadFormat {
                key: "startDate".into(),
                format: "YYYYMMDD",
                value: "2024-01-01".into(),
            }
        );
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn create_posts_to_task_list() {
        let fake = Arc::new(RecordingClient::ok());
        create_task(
            fake.clone(),
            bag(json!({
                "tasklistId": 7,
                "name": "Write release notes",
                "dueDate": "2024-02-29",
                "assigneeUserIds": [11, 12],
                "estimateMinutes": 90.0
            })),
        )
        .await
        .unwrap();

        let request = fake.last();
        assert_eq!(request.path(), "projects/api/v3/tasklists/7/tasks.json");
        assert_eq!(
            request.body(),
            Some(&json!({
                "task": {
                    "name": "Write release notes",
                    "dueAt": "2024-02-29",
                    "assigneeUserIds": [11, 12],
                    "estimateMinutes": 90
                }
            }))
        );
    }

    #[tokio::test]
    async fn update_checks_progress_range() {
        let fake = Arc::new(RecordingClient::ok());
        let err = update_task(fake.clone(), bag(json!({ "id": 3, "progress": 300 })))
            .await
            .expect_err("progress overflows u8");
        assert!(err.to_string().contains("does not fit in u8"));

        let err = update_task(fake.clone(), bag(json!({ "id": 3, "progress": 101 })))
            .await
            .expect_err("progress is a percentage");
        assert!(err.to_string().contains("must be between 0 and 100"));
        assert!(fake.requests().is_empty());

        update_task(fake.clone(), bag(json!({ "id": 3, "progress": 50, "priority": "high" })))
            .await
            .unwrap();
        assert_eq!(
            fake.last().body(),
            Some(&json!({ "task": { "priority": "high", "progress": 50 } }))
        );
    }

    #[tokio::test]
    async fn delete_reports_success_text() {
        let fake = Arc::new(RecordingClient::ok());
        let output = delete_task(fake.clone(), bag(json!({ "id": 8 }))).await.unwrap();
        assert_eq!(output.as_text(), "task 8 deleted");
        assert_eq!(fake.last().path(), "projects/api/v3/tasks/8.json");
    }
}
