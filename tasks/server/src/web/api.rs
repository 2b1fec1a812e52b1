use std::sync::Arc;

use crate::{
    auth::{self, AuthState},
    task::api::v1::{
        self as tasks_v1, CreateTaskRequest, MessageResponse, TaskJson, TaskState,
        UpdateTaskRequest,
    },
};

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use utoipa::{OpenApi, ToSchema};

/// JSON response for API errors
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        tasks_v1::list_tasks_handler,
        tasks_v1::create_task_handler,
        tasks_v1::get_task_handler,
        tasks_v1::update_task_handler,
        tasks_v1::delete_task_handler,
        tasks_v1::complete_task_handler,
    ),
    components(schemas(
        TaskJson,
        CreateTaskRequest,
        UpdateTaskRequest,
        MessageResponse,
        ErrorResponse
    )),
    tags((name = "Tasks", description = "Per-user task tracking"))
)]
pub struct ApiDoc;

/// Creates the API routes for JSON API endpoints.
pub fn create_api_router(auth_state: Arc<AuthState>, task_state: Arc<TaskState>) -> Router {
    let tasks_router = tasks_v1::create_api_router(task_state)
        .layer(ServiceBuilder::new().layer(from_fn(auth::api::v1::require_auth_middleware)));
    Router::new()
        .nest("/api/v1", tasks_router)
        .layer(ServiceBuilder::new().layer(from_fn_with_state(
            auth_state,
            auth::api::v1::auth_user_middleware,
        )))
}
