use crate::auth::CurrentUser;
use crate::task::{NewTask, Task, TaskChanges, TaskError, TaskService};
use crate::web::api::ErrorResponse;
use axum::{
    Extension, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

const TASK_NOT_FOUND: &str = "Task not found";

/// Shared state for the task endpoints.
#[derive(Clone)]
pub struct TaskState {
    pub service: Arc<dyn TaskService>,
}

impl TaskState {
    pub fn new(service: Arc<dyn TaskService>) -> Self {
        Self { service }
    }
}

/// JSON representation of a Task for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskJson {
    /// Unique identifier for the task
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    /// Due date formatted as YYYY-MM-DD
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<NaiveDate>,
    /// Whether the task has been completed
    pub status: bool,
    /// ID of the user owning the task
    pub user_id: i64,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<FixedOffset>,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<FixedOffset>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            due_date: task.due_date,
            status: task.status,
            user_id: task.user_id,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Request body for creating a task.
///
/// Any `status` or `user_id` sent by the client is ignored.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<NaiveDate>,
}

/// Request body for updating a task. Omitted fields are left unchanged,
/// an explicit `null` clears `description` or `due_date`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<Option<NaiveDate>>,
}

/// Marks a field as present even when its value is `null`.
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl From<UpdateTaskRequest> for TaskChanges {
    fn from(request: UpdateTaskRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            due_date: request.due_date,
        }
    }
}

/// Message body returned by update, delete and complete.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Error type for task handler operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskApiError {
    /// The requested task does not exist.
    #[error("Task not found")]
    NotFound,
    /// Represents a storage failure.
    #[error("Storage error")]
    Storage(#[from] TaskError),
}

impl IntoResponse for TaskApiError {
    fn into_response(self) -> Response {
        match self {
            TaskApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(MessageResponse::new(TASK_NOT_FOUND)),
            )
                .into_response(),
            TaskApiError::Storage(err) => {
                tracing::error!("Task storage failure: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(
                        "INTERNAL_SERVER_ERROR",
                        "An unexpected error occurred while processing your request",
                    )),
                )
                    .into_response()
            }
        }
    }
}

fn message_or_not_found(
    found: bool,
    message: &str,
) -> Result<Json<MessageResponse>, TaskApiError> {
    if found {
        Ok(Json(MessageResponse::new(message)))
    } else {
        Err(TaskApiError::NotFound)
    }
}

/// Handler for GET /api/v1/tasks - Returns the caller's tasks.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    responses(
        (status = 200, description = "Tasks owned by the caller", body = Vec<TaskJson>),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<TaskState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<Vec<TaskJson>>, TaskApiError> {
    let tasks = state.service.get_all_tasks(current_user.user_id).await?;
    Ok(Json(tasks.into_iter().map(TaskJson::from).collect()))
}

/// Handler for POST /api/v1/tasks - Creates a task owned by the caller.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskJson),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 422, description = "Malformed request body"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskJson>), TaskApiError> {
    let new_task = NewTask {
        title: payload.title,
        description: payload.description,
        due_date: payload.due_date,
        user_id: current_user.user_id,
    };
    let task = state.service.create_task(new_task).await?;
    Ok((StatusCode::CREATED, Json(TaskJson::from(task))))
}

/// Handler for GET /api/v1/tasks/{id} - Returns a single task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "The task", body = TaskJson),
        (status = 404, description = "Task not found", body = MessageResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(task_id): Path<i32>,
) -> Result<Json<TaskJson>, TaskApiError> {
    state
        .service
        .get_task_by_id(task_id)
        .await?
        .map(|task| Json(TaskJson::from(task)))
        .ok_or(TaskApiError::NotFound)
}

/// Handler for PUT/PATCH /api/v1/tasks/{id} - Updates title, description and due date.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = MessageResponse),
        (status = 404, description = "Task not found", body = MessageResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(task_id): Path<i32>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<MessageResponse>, TaskApiError> {
    let updated = state
        .service
        .update_task(task_id, TaskChanges::from(payload))
        .await?;
    message_or_not_found(updated, "Task updated successfully")
}

/// Handler for DELETE /api/v1/tasks/{id}.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 404, description = "Task not found", body = MessageResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(task_id): Path<i32>,
) -> Result<Json<MessageResponse>, TaskApiError> {
    let deleted = state.service.delete_task(task_id).await?;
    message_or_not_found(deleted, "Task deleted successfully")
}

/// Handler for POST /api/v1/tasks/{id}/complete.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/complete",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task marked as completed", body = MessageResponse),
        (status = 404, description = "Task not found", body = MessageResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn complete_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(task_id): Path<i32>,
) -> Result<Json<MessageResponse>, TaskApiError> {
    let completed = state.service.complete_task(task_id).await?;
    message_or_not_found(completed, "Task marked as completed")
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .patch(update_task_handler)
                .delete(delete_task_handler),
        )
        .route("/tasks/{id}/complete", post(complete_task_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::service::MockTaskService;
    use axum::body::Body;
    use axum::extract::Request;
    use axum::middleware::{Next, from_fn};
    use chrono::Utc;
    use mockall::predicate::eq;
    use tower::ServiceExt;

    fn sample_task(id: i32, user_id: i64) -> Task {
        let now = Utc::now().fixed_offset();
        Task {
            id,
            title: "Buy milk".to_string(),
            description: None,
            due_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            status: false,
            user_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds the router with a stub middleware authenticating every request as user 7.
    fn create_test_app(service: MockTaskService) -> Router {
        let state = Arc::new(TaskState::new(Arc::new(service)));
        create_api_router(state).layer(from_fn(
            |mut request: Request, next: Next| async move {
                request.extensions_mut().insert(CurrentUser::new(7));
                next.run(request).await
            },
        ))
    }

    async fn send(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = axum::http::Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn list_uses_caller_id() {
        let mut service = MockTaskService::new();
        service
            .expect_get_all_tasks()
            .with(eq(7))
            .times(1)
            .returning(|user_id| Ok(vec![sample_task(1, user_id)]));

        let (status, json) = send(create_test_app(service), "GET", "/tasks", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["user_id"], 7);
        assert_eq!(json[0]["due_date"], "2024-01-01");
    }

    #[tokio::test]
    async fn create_ignores_client_status_and_owner() {
        let mut service = MockTaskService::new();
        service
            .expect_create_task()
            .withf(|new_task| new_task.user_id == 7 && new_task.title == "Buy milk")
            .times(1)
            .returning(|new_task| Ok(sample_task(1, new_task.user_id)));

        let (status, json) = send(
            create_test_app(service),
            "POST",
            "/tasks",
            Some(r#"{"title":"Buy milk","due_date":"2024-01-01","status":true,"user_id":99}"#),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["status"], false);
        assert_eq!(json["user_id"], 7);
    }

    #[tokio::test]
    async fn create_rejects_body_without_title() {
        let mut service = MockTaskService::new();
        service.expect_create_task().never();

        let (status, _) = send(
            create_test_app(service),
            "POST",
            "/tasks",
            Some(r#"{"description":"no title"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn update_distinguishes_null_from_missing_fields() {
        let mut service = MockTaskService::new();
        service
            .expect_update_task()
            .withf(|task_id, changes| {
                *task_id == 3
                    && changes.title.is_none()
                    && changes.description == Some(None)
                    && changes.due_date.is_none()
            })
            .times(1)
            .returning(|_, _| Ok(true));

        let (status, json) = send(
            create_test_app(service),
            "PATCH",
            "/tasks/3",
            Some(r#"{"description":null}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Task updated successfully");
    }

    #[tokio::test]
    async fn update_of_missing_task_returns_not_found() {
        let mut service = MockTaskService::new();
        service.expect_update_task().returning(|_, _| Ok(false));

        let (status, json) = send(
            create_test_app(service),
            "PUT",
            "/tasks/9999",
            Some(r#"{"title":"Nope"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Task not found");
    }

    #[tokio::test]
    async fn show_returns_not_found_for_missing_task() {
        let mut service = MockTaskService::new();
        service
            .expect_get_task_by_id()
            .with(eq(5))
            .returning(|_| Ok(None));

        let (status, json) = send(create_test_app(service), "GET", "/tasks/5", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Task not found");
    }

    #[tokio::test]
    async fn delete_and_complete_report_success_messages() {
        let mut service = MockTaskService::new();
        service.expect_delete_task().with(eq(1)).returning(|_| Ok(true));
        service
            .expect_complete_task()
            .with(eq(2))
            .returning(|_| Ok(true));
        let app = create_test_app(service);

        let (status, json) = send(app.clone(), "DELETE", "/tasks/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Task deleted successfully");

        let (status, json) = send(app, "POST", "/tasks/2/complete", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Task marked as completed");
    }

    #[tokio::test]
    async fn storage_failure_returns_internal_server_error() {
        let mut service = MockTaskService::new();
        service
            .expect_complete_task()
            .returning(|_| Err(TaskError::Database(sea_orm::DbErr::Custom("boom".into()))));

        let (status, json) =
            send(create_test_app(service), "POST", "/tasks/1/complete", None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "INTERNAL_SERVER_ERROR");
    }
}
