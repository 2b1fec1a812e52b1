//! Tasks owned by authenticated users.
//!
//! The module is split the same way requests flow through it:
//! - [`api`] maps HTTP requests onto [`service::TaskService`] calls
//! - [`service`] applies the "not found" policy on top of the repository
//! - [`repository`] is the only place that talks to the database

use crate::entities::tasks;
use chrono::{DateTime, FixedOffset, NaiveDate};

pub mod api;
pub mod repository;
pub mod service;

pub use repository::{SeaOrmTaskRepository, TaskRepository};
pub use service::{DefaultTaskService, TaskService};

/// A to-do item owned by a single user.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    /// `true` once the task has been marked as completed.
    pub status: bool,
    pub user_id: i64,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<tasks::Model> for Task {
    fn from(model: tasks::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            due_date: model.due_date,
            status: model.status,
            user_id: model.user_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fields required to create a task.
///
/// There is no `status` field: new tasks always start out incomplete.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub user_id: i64,
}

/// A partial update of a task.
///
/// `None` leaves a field untouched. For the nullable fields `Some(None)` clears
/// the stored value.
#[derive(Debug, PartialEq, Clone, Eq, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
}

/// Error type for task persistence and service operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}
